//! Signed-in session state shared across pages.
//!
//! One [`SessionContext`] lives for the lifetime of the app shell. Pages
//! clone it freely; clones share the cached snapshot, so a sign-in on one
//! page is visible to every guard that runs afterwards.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use radboard_models::{ProfileRecord, Role, UserId};
use radboard_supabase::{AuthUser, ProfileRepository, SupabaseClient, SupabaseError};

use crate::error::{AppError, AppResult};

// =============================================================================
// Snapshot
// =============================================================================

/// The signed-in account plus its profile row, if that row is readable.
///
/// `record` stays `None` for accounts whose provisioning never finished;
/// everything here degrades to the signup metadata so such accounts can
/// still reach the profile page and repair themselves.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: AuthUser,
    pub record: Option<ProfileRecord>,
}

impl SessionSnapshot {
    pub fn account_id(&self) -> &UserId {
        &self.user.id
    }

    /// Role from the profile row, falling back to signup metadata.
    pub fn role(&self) -> Option<Role> {
        self.record
            .as_ref()
            .map(|r| r.role())
            .or(self.user.user_metadata.role)
    }

    /// Best-effort name for the header: profile names, then signup
    /// metadata, then the email address.
    pub fn display_name(&self) -> String {
        if let Some(record) = &self.record {
            return format!("{} {}", record.profile.first_name, record.profile.last_name);
        }
        let meta = &self.user.user_metadata;
        match (&meta.first_name, &meta.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.user.email.clone().unwrap_or_else(|| "Account".to_string()),
        }
    }
}

// =============================================================================
// Context
// =============================================================================

/// Holds who is signed in and answers it without a network round trip.
pub struct SessionContext {
    client: SupabaseClient,
    profiles: ProfileRepository,
    current: Arc<RwLock<Option<SessionSnapshot>>>,
}

impl Clone for SessionContext {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            profiles: self.profiles.clone(),
            current: Arc::clone(&self.current),
        }
    }
}

impl SessionContext {
    pub fn new(client: SupabaseClient) -> Self {
        let profiles = ProfileRepository::new(client.clone());
        Self {
            client,
            profiles,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// Sign in and cache the resulting snapshot.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionSnapshot> {
        let session = self
            .client
            .sign_in(email, password)
            .await
            .map_err(|e| match e {
                SupabaseError::AuthError(_) => AppError::InvalidCredentials,
                other => AppError::Backend(other),
            })?;

        let snapshot = self.load_snapshot(session.user).await;
        info!("Signed in {}", snapshot.account_id());
        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Rebuild the snapshot from a token held by the client, if any.
    ///
    /// A rejected token is treated as signed-out, not as an error; the
    /// stale token is dropped so later calls start clean.
    pub async fn restore(&self) -> AppResult<Option<SessionSnapshot>> {
        if self.client.access_token().await.is_none() {
            return Ok(None);
        }

        let user = match self.client.current_user().await {
            Ok(user) => user,
            Err(SupabaseError::AuthError(msg)) => {
                info!("Stored session no longer valid: {}", msg);
                self.client.clear_access_token().await;
                return Ok(None);
            }
            Err(e) => return Err(AppError::Backend(e)),
        };

        let snapshot = self.load_snapshot(user).await;
        *self.current.write().await = Some(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// The cached snapshot, without touching the network.
    pub async fn current(&self) -> Option<SessionSnapshot> {
        self.current.read().await.clone()
    }

    /// Re-read the profile row for the signed-in account, refreshing the
    /// cache. Call after profile edits.
    pub async fn refresh_profile(&self) -> AppResult<Option<SessionSnapshot>> {
        let Some(snapshot) = self.current().await else {
            return Ok(None);
        };

        let record = self.profiles.fetch_record(snapshot.account_id()).await?;
        let refreshed = SessionSnapshot {
            user: snapshot.user,
            record,
        };
        *self.current.write().await = Some(refreshed.clone());
        Ok(Some(refreshed))
    }

    /// Drop the cached snapshot and revoke the session.
    pub async fn sign_out(&self) -> AppResult<()> {
        *self.current.write().await = None;
        self.client.sign_out().await?;
        info!("Signed out");
        Ok(())
    }

    /// Seed the cache from a finished signup, when a live session came back.
    pub async fn adopt(&self, user: AuthUser, record: Option<ProfileRecord>) {
        *self.current.write().await = Some(SessionSnapshot { user, record });
    }

    async fn load_snapshot(&self, user: AuthUser) -> SessionSnapshot {
        // The profile read must not fail the sign-in; accounts with a
        // provisioning hole still get a session.
        let record = match self.profiles.fetch_record(&user.id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not load profile for {}: {}", user.id, e);
                None
            }
        };
        SessionSnapshot { user, record }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use radboard_models::Profile;
    use radboard_supabase::UserMetadata;

    fn bare_user(role: Option<Role>) -> AuthUser {
        AuthUser {
            id: UserId::from_string("user-1"),
            email: Some("casey@example.com".to_string()),
            email_confirmed_at: None,
            user_metadata: UserMetadata {
                role,
                first_name: Some("Casey".to_string()),
                last_name: Some("Reyes".to_string()),
            },
            created_at: None,
        }
    }

    fn profile_record() -> ProfileRecord {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "user-1",
            "email": "casey@example.com",
            "role": "tech",
            "first_name": "Casey",
            "last_name": "Reyes",
            "created_at": "2024-03-01T00:00:00Z",
            "updated_at": "2024-03-01T00:00:00Z",
        }))
        .expect("profile json");
        ProfileRecord::from_base(profile)
    }

    #[test]
    fn test_role_prefers_profile_row_over_metadata() {
        let snapshot = SessionSnapshot {
            user: bare_user(Some(Role::Employer)),
            record: Some(profile_record()),
        };
        assert_eq!(snapshot.role(), Some(Role::Tech));
    }

    #[test]
    fn test_role_falls_back_to_signup_metadata() {
        let snapshot = SessionSnapshot {
            user: bare_user(Some(Role::Tech)),
            record: None,
        };
        assert_eq!(snapshot.role(), Some(Role::Tech));
    }

    #[test]
    fn test_display_name_from_metadata_when_profile_missing() {
        let snapshot = SessionSnapshot {
            user: bare_user(None),
            record: None,
        };
        assert_eq!(snapshot.display_name(), "Casey Reyes");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = bare_user(None);
        user.user_metadata = UserMetadata::default();
        let snapshot = SessionSnapshot { user, record: None };
        assert_eq!(snapshot.display_name(), "casey@example.com");
    }
}
