//! Supabase error types.

use thiserror::Error;

/// Error codes surfaced in row-store error bodies.
pub mod codes {
    /// Postgres unique_violation
    pub const UNIQUE_VIOLATION: &str = "23505";
    /// Postgres foreign_key_violation
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    /// Single-object read matched zero or multiple rows
    pub const SINGLE_OBJECT_COERCION: &str = "PGRST116";
    /// Schema cache has no such stored procedure
    pub const RPC_NOT_FOUND: &str = "PGRST202";
}

/// Result type for Supabase operations.
pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Errors that can occur against the auth gateway or the row store.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Signup rejected: {0}")]
    SignupRejected(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The "no rows / multiple rows" signature from single-object reads.
    /// Right after signup this is also what a row hidden by row security
    /// looks like from the outside.
    #[error("Single-row read matched zero or multiple rows: {0}")]
    RowAmbiguity(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Stored procedure not available: {0}")]
    RpcMissing(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify an error from its HTTP status and the body's error code.
    ///
    /// Body codes take precedence: the row store reports constraint
    /// violations with a Postgres SQLSTATE under a generic 4xx status.
    pub fn from_http_status(status: u16, code: Option<&str>, message: String) -> Self {
        match code {
            Some(codes::UNIQUE_VIOLATION) => return Self::UniqueViolation(message),
            Some(codes::FOREIGN_KEY_VIOLATION) => return Self::ForeignKeyViolation(message),
            Some(codes::SINGLE_OBJECT_COERCION) => return Self::RowAmbiguity(message),
            Some(codes::RPC_NOT_FOUND) => return Self::RpcMissing(message),
            _ => {}
        }

        match status {
            401 => Self::AuthError(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            406 => Self::RowAmbiguity(message),
            409 if message.contains("duplicate key") => Self::UniqueViolation(message),
            409 if message.contains("foreign key") => Self::ForeignKeyViolation(message),
            429 => Self::RateLimited(1_000),
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(message),
        }
    }

    /// Classify from a raw response body.
    ///
    /// Handles both error dialects: the row store's `{code, message}` and the
    /// auth gateway's `{msg}` / `{error_description}`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let value: serde_json::Value = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
        let code = value.get("code").and_then(|c| c.as_str()).map(str::to_string);
        let message = value
            .get("message")
            .or_else(|| value.get("msg"))
            .or_else(|| value.get("error_description"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.chars().take(200).collect());

        Self::from_http_status(status, code.as_deref(), message)
    }

    /// HTTP status this error corresponds to, for metrics labels.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SupabaseError::AuthError(_) => Some(401),
            SupabaseError::SignupRejected(_) => Some(422),
            SupabaseError::PermissionDenied(_) => Some(403),
            SupabaseError::NotFound(_) | SupabaseError::RpcMissing(_) => Some(404),
            SupabaseError::RowAmbiguity(_) => Some(406),
            SupabaseError::UniqueViolation(_) | SupabaseError::ForeignKeyViolation(_) => Some(409),
            SupabaseError::RateLimited(_) => Some(429),
            SupabaseError::ServerError(status, _) => Some(*status),
            _ => None,
        }
    }

    /// Check if the error is worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SupabaseError::Network(_)
                | SupabaseError::RateLimited(_)
                | SupabaseError::ServerError(..)
        )
    }

    /// Server-requested delay before the next attempt, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SupabaseError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
