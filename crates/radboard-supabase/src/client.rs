//! Supabase REST client.
//!
//! One client covers both halves of the hosted backend:
//! - the auth gateway under `/auth/v1` (accounts, sessions)
//! - the row store under `/rest/v1` (tables, stored procedures)
//!
//! Production-grade client with:
//! - HTTP client tuning (pooling, timeouts)
//! - Per-request bearer resolution (session token, anon key when signed out)
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info_span, Instrument};
use url::Url;

use crate::error::{SupabaseError, SupabaseResult};
use crate::metrics::{record_request, record_rows_returned};
use crate::query::{Filter, Order};

/// Single-object representation; turns zero-or-many matches into an error.
const ACCEPT_SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

// =============================================================================
// Configuration
// =============================================================================

/// Supabase client configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    /// Publishable anon key, sent as `apikey` on every request
    pub anon_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl SupabaseConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| SupabaseError::auth_error("SUPABASE_URL must be set"))?;
        if url.is_empty() {
            return Err(SupabaseError::auth_error("SUPABASE_URL cannot be empty"));
        }
        Url::parse(&url)
            .map_err(|e| SupabaseError::auth_error(format!("SUPABASE_URL is not a valid URL: {}", e)))?;

        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| SupabaseError::auth_error("SUPABASE_ANON_KEY must be set"))?;
        if anon_key.is_empty() {
            return Err(SupabaseError::auth_error("SUPABASE_ANON_KEY cannot be empty"));
        }

        let connect_timeout_secs: u64 = std::env::var("SUPABASE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self::new(url, anon_key).with_connect_timeout(Duration::from_secs(connect_timeout_secs)))
    }

    /// Create config with default timeouts.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Supabase REST client.
pub struct SupabaseClient {
    pub(crate) http: Client,
    pub(crate) config: SupabaseConfig,
    pub(crate) rest_base: String,
    pub(crate) auth_base: String,
    /// Session token slot, shared by all clones
    access_token: Arc<RwLock<Option<String>>>,
}

impl Clone for SupabaseClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            rest_base: self.rest_base.clone(),
            auth_base: self.auth_base.clone(),
            access_token: Arc::clone(&self.access_token),
        }
    }
}

impl SupabaseClient {
    /// Create a new Supabase client.
    pub fn new(config: SupabaseConfig) -> SupabaseResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("radboard-supabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SupabaseError::Network)?;

        let rest_base = format!("{}/rest/v1", config.url);
        let auth_base = format!("{}/auth/v1", config.url);

        Ok(Self {
            http,
            config,
            rest_base,
            auth_base,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let config = SupabaseConfig::from_env()?;
        Self::new(config)
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    // =========================================================================
    // Session token slot
    // =========================================================================

    /// Store the session token used for authenticated requests.
    pub async fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write().await = Some(token.into());
    }

    /// Drop the stored session token; subsequent requests fall back to the
    /// anon key.
    pub async fn clear_access_token(&self) {
        *self.access_token.write().await = None;
    }

    /// The currently stored session token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    /// Bearer value for the next request: session token when signed in,
    /// anon key otherwise (gateway convention).
    pub(crate) async fn bearer(&self) -> String {
        self.access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    /// Start a request with the `apikey` + bearer headers attached.
    pub(crate) async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer().await)
    }

    /// Build a table URL with filters, ordering, and limit.
    fn table_url(
        &self,
        table: &str,
        select: Option<&str>,
        filters: &[Filter],
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(select) = select {
            params.push(format!("select={}", urlencoding::encode(select)));
        }
        for filter in filters {
            params.push(filter.to_query_pair());
        }
        if let Some(order) = order {
            params.push(order.to_query_pair());
        }
        if let Some(limit) = limit {
            params.push(format!("limit={}", limit));
        }

        if params.is_empty() {
            format!("{}/{}", self.rest_base, table)
        } else {
            format!("{}/{}?{}", self.rest_base, table, params.join("&"))
        }
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Read rows matching the filters.
    pub async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        select: Option<&str>,
        filters: &[Filter],
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> SupabaseResult<Vec<T>> {
        let url = self.table_url(table, select, filters, order, limit);

        self.execute_request("select_rows", table, async {
            let response = self.request(Method::GET, &url).await.send().await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let rows: Vec<T> = response.json().await?;
                    record_rows_returned(table, rows.len() as u64);
                    Ok(rows)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Read exactly one row using the single-object representation.
    ///
    /// Zero or multiple matches come back as `RowAmbiguity`.
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        select: Option<&str>,
        filters: &[Filter],
    ) -> SupabaseResult<T> {
        let url = self.table_url(table, select, filters, None, None);

        self.execute_request("select_single", table, async {
            let response = self
                .request(Method::GET, &url)
                .await
                .header(reqwest::header::ACCEPT, ACCEPT_SINGLE_OBJECT)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let row: T = response.json().await?;
                    Ok(row)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Insert one row and return its stored representation.
    pub async fn insert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> SupabaseResult<T> {
        let url = self.table_url(table, None, &[], None, None);

        self.execute_request("insert_row", table, async {
            let response = self
                .request(Method::POST, &url)
                .await
                .header("Prefer", PREFER_REPRESENTATION)
                .header(reqwest::header::ACCEPT, ACCEPT_SINGLE_OBJECT)
                .json(row)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let stored: T = response.json().await?;
                    Ok(stored)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Insert-or-update on the primary key, returning the stored row.
    pub async fn upsert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> SupabaseResult<T> {
        let url = self.table_url(table, None, &[], None, None);

        self.execute_request("upsert_row", table, async {
            let response = self
                .request(Method::POST, &url)
                .await
                .header("Prefer", PREFER_UPSERT)
                .header(reqwest::header::ACCEPT, ACCEPT_SINGLE_OBJECT)
                .json(row)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let stored: T = response.json().await?;
                    Ok(stored)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Patch rows matching the filters, returning the updated rows.
    pub async fn update_rows<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
        changes: &B,
    ) -> SupabaseResult<Vec<T>> {
        let url = self.table_url(table, None, filters, None, None);

        self.execute_request("update_rows", table, async {
            let response = self
                .request(Method::PATCH, &url)
                .await
                .header("Prefer", PREFER_REPRESENTATION)
                .json(changes)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let rows: Vec<T> = response.json().await?;
                    Ok(rows)
                }
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Delete rows matching the filters.
    pub async fn delete_rows(&self, table: &str, filters: &[Filter]) -> SupabaseResult<()> {
        let url = self.table_url(table, None, filters, None, None);

        self.execute_request("delete_rows", table, async {
            let response = self.request(Method::DELETE, &url).await.send().await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    /// Call a stored procedure. A void procedure yields `Value::Null`.
    pub async fn rpc<A: Serialize>(
        &self,
        function: &str,
        args: &A,
    ) -> SupabaseResult<serde_json::Value> {
        let url = format!("{}/rpc/{}", self.rest_base, function);

        self.execute_request("rpc", function, async {
            let response = self
                .request(Method::POST, &url)
                .await
                .json(args)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let body = response.text().await?;
                    if body.is_empty() {
                        return Ok(serde_json::Value::Null);
                    }
                    let value: serde_json::Value = serde_json::from_str(&body)?;
                    Ok(value)
                }
                StatusCode::NO_CONTENT => Ok(serde_json::Value::Null),
                _ => Err(Self::handle_error_response(status, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    pub(crate) async fn execute_request<T, F>(
        &self,
        operation: &str,
        target: &str,
        fut: F,
    ) -> SupabaseResult<T>
    where
        F: std::future::Future<Output = SupabaseResult<T>>,
    {
        let span = info_span!("supabase_request", operation = %operation, target = %target);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    pub(crate) async fn handle_error_response(
        status: StatusCode,
        response: reqwest::Response,
    ) -> SupabaseError {
        let body = response.text().await.unwrap_or_default();
        SupabaseError::from_body(status.as_u16(), &body)
    }
}
