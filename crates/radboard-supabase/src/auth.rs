//! Auth gateway operations: signup, sign-in, sign-out, current user.

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use radboard_models::{Role, SignUpRequest, UserId};

use crate::client::SupabaseClient;
use crate::error::{SupabaseError, SupabaseResult};

// =============================================================================
// Types
// =============================================================================

/// Signup metadata persisted on the account. The backend provisioning
/// trigger reads role and names from here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Gateway account object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub user_metadata: UserMetadata,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An authenticated session issued by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    pub user: AuthUser,
}

/// What signup produced: always an account, and a live session unless the
/// gateway is holding it for email confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// The gateway has shipped this payload in two shapes over time: a session
/// envelope with the user inside, and a bare user object when no session is
/// issued. Accept all of them.
fn parse_signup_payload(value: serde_json::Value) -> SupabaseResult<SignUpOutcome> {
    if value.get("access_token").is_some() {
        let session: Session = serde_json::from_value(value)?;
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    if let Some(user_value) = value.get("user") {
        let user: AuthUser = serde_json::from_value(user_value.clone())?;
        let session = match value.get("session") {
            Some(s) if !s.is_null() => Some(serde_json::from_value(s.clone())?),
            _ => None,
        };
        return Ok(SignUpOutcome { user, session });
    }

    if value.get("id").is_some() {
        let user: AuthUser = serde_json::from_value(value)?;
        return Ok(SignUpOutcome { user, session: None });
    }

    Err(SupabaseError::invalid_response(
        "signup response carried no account object",
    ))
}

// =============================================================================
// Gateway calls
// =============================================================================

impl SupabaseClient {
    /// Create an account. Role and names ride along as signup metadata.
    ///
    /// Gateway rejections (duplicate email, weak password) surface as
    /// `SignupRejected` with the gateway's message.
    pub async fn sign_up(&self, request: &SignUpRequest) -> SupabaseResult<SignUpOutcome> {
        let url = format!("{}/signup", self.auth_base);
        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "role": request.role,
                "first_name": request.first_name,
                "last_name": request.last_name,
            }
        });

        let outcome = self
            .execute_request("sign_up", "auth", async {
                let response = self
                    .request(Method::POST, &url)
                    .await
                    .json(&body)
                    .send()
                    .await?;
                let status = response.status();

                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    let err = SupabaseError::from_body(status.as_u16(), &text);
                    return Err(match (status.as_u16(), err) {
                        (400 | 422, SupabaseError::AuthError(msg))
                        | (400 | 422, SupabaseError::RequestFailed(msg)) => {
                            SupabaseError::SignupRejected(msg)
                        }
                        (_, other) => other,
                    });
                }

                let value: serde_json::Value = response.json().await?;
                parse_signup_payload(value)
            })
            .await?;

        // Later provisioning reads should run as the new user, not as anon.
        if let Some(session) = &outcome.session {
            self.set_access_token(session.access_token.clone()).await;
        }
        Ok(outcome)
    }

    /// Password sign-in. The session token is stored on the client so
    /// subsequent row reads run as the user.
    pub async fn sign_in(&self, email: &str, password: &str) -> SupabaseResult<Session> {
        let url = format!("{}/token?grant_type=password", self.auth_base);
        let body = json!({ "email": email, "password": password });

        let session = self
            .execute_request("sign_in", "auth", async {
                let response = self
                    .request(Method::POST, &url)
                    .await
                    .json(&body)
                    .send()
                    .await?;
                let status = response.status();

                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    let err = SupabaseError::from_body(status.as_u16(), &text);
                    return Err(match err {
                        SupabaseError::RequestFailed(msg) => SupabaseError::AuthError(msg),
                        other => other,
                    });
                }

                let session: Session = response.json().await?;
                Ok(session)
            })
            .await?;

        self.set_access_token(session.access_token.clone()).await;
        Ok(session)
    }

    /// Sign out. The local token is dropped first; gateway revocation is
    /// best-effort and a dead session does not fail the call.
    pub async fn sign_out(&self) -> SupabaseResult<()> {
        let Some(token) = self.access_token().await else {
            return Ok(());
        };
        self.clear_access_token().await;

        let url = format!("{}/logout", self.auth_base);
        let result = self
            .execute_request("sign_out", "auth", async {
                let response = self
                    .http
                    .post(&url)
                    .header("apikey", &self.config.anon_key)
                    .bearer_auth(&token)
                    .send()
                    .await?;
                let status = response.status();

                match status {
                    StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::UNAUTHORIZED => Ok(()),
                    _ => Err(SupabaseClient::handle_error_response(status, response).await),
                }
            })
            .await;

        if let Err(e) = result {
            warn!("gateway sign-out failed after local invalidation: {}", e);
        }
        Ok(())
    }

    /// Fetch the account behind the stored session token.
    pub async fn current_user(&self) -> SupabaseResult<AuthUser> {
        if self.access_token().await.is_none() {
            return Err(SupabaseError::auth_error("no session token stored"));
        }

        let url = format!("{}/user", self.auth_base);
        self.execute_request("current_user", "auth", async {
            let response = self.request(Method::GET, &url).await.send().await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let user: AuthUser = response.json().await?;
                    Ok(user)
                }
                _ => Err(SupabaseClient::handle_error_response(status, response).await),
            }
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signup_session_envelope() {
        let value = json!({
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-abc",
            "user": {
                "id": "3e9b6a1e-4c2f-4b3a-8460-6edb5d0ff260",
                "email": "tech@example.com",
                "user_metadata": { "role": "tech", "first_name": "Dana", "last_name": "Reyes" }
            }
        });

        let outcome = parse_signup_payload(value).unwrap();
        assert_eq!(outcome.user.id.as_str(), "3e9b6a1e-4c2f-4b3a-8460-6edb5d0ff260");
        assert_eq!(outcome.user.user_metadata.role, Some(Role::Tech));
        assert!(outcome.session.is_some());
    }

    #[test]
    fn test_parse_signup_user_session_pair() {
        let value = json!({
            "user": { "id": "u-1", "email": "a@b.com" },
            "session": null
        });

        let outcome = parse_signup_payload(value).unwrap();
        assert_eq!(outcome.user.id.as_str(), "u-1");
        assert!(outcome.session.is_none());
    }

    #[test]
    fn test_parse_signup_bare_user() {
        let value = json!({ "id": "u-2", "email": "a@b.com" });

        let outcome = parse_signup_payload(value).unwrap();
        assert_eq!(outcome.user.id.as_str(), "u-2");
        assert!(outcome.session.is_none());
    }

    #[test]
    fn test_parse_signup_garbage_is_invalid_response() {
        let err = parse_signup_payload(json!({ "hello": "world" })).unwrap_err();
        assert!(matches!(err, SupabaseError::InvalidResponse(_)));
    }
}
