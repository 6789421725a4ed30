//! Account provisioning sequencer.
//!
//! Signup returns an account id immediately, but the profile row hangs off a
//! backend trigger that runs asynchronously and may be invisible to its own
//! creator for a while (row security can block the read-back). This module
//! walks a staged sequence to get the row confirmed or created:
//!
//! 1. create the account (the only fatal step)
//! 2. settle delay so the trigger has a chance to run
//! 3. ask the provisioning helper procedure to create the row, with retries
//! 4. poll for the row, counting a blocked read as likely-present
//! 5. insert the row directly as a last resort
//! 6. one final read to decide the reported status
//!
//! Ambiguity never fails the signup. Duplicate inserts bounce off the
//! primary key, so the worst case is a warning on an account whose profile
//! self-heals on first edit.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

use radboard_models::{NewProfile, SignUpRequest, UserId};
use radboard_supabase::{
    ProfilePresence, ProfileRepository, Session, SupabaseClient, SupabaseError,
};

use crate::error::{AppError, AppResult};
use crate::retry::{retry_async, Backoff, RetryConfig, RetryResult, Retryable};

/// Server-side helper procedure that creates the profile row.
const SIGNUP_RPC: &str = "handle_user_signup";

// =============================================================================
// Configuration
// =============================================================================

/// Delays and attempt budgets for the provisioning sequence.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Wait after account creation before touching the row store.
    pub settle_delay: Duration,
    /// Helper procedure attempts.
    pub rpc_attempts: u32,
    /// Base delay between helper attempts (grows linearly).
    pub rpc_base_delay: Duration,
    /// Existence poll attempts.
    pub verify_attempts: u32,
    /// Delay between existence polls (fixed).
    pub verify_delay: Duration,
    /// Direct insert attempts.
    pub insert_attempts: u32,
    /// Base delay between insert attempts (grows linearly).
    pub insert_base_delay: Duration,
    /// Longer backoff base for inserts bounced by the account foreign key.
    pub fk_base_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            rpc_attempts: 3,
            rpc_base_delay: Duration::from_secs(1),
            verify_attempts: 5,
            verify_delay: Duration::from_secs(1),
            insert_attempts: 3,
            insert_base_delay: Duration::from_secs(1),
            fk_base_delay: Duration::from_secs(2),
        }
    }
}

impl SequencerConfig {
    /// Same attempt budgets with compressed delays, for tests and local
    /// smoke runs.
    pub fn fast() -> Self {
        Self {
            settle_delay: Duration::from_millis(5),
            rpc_base_delay: Duration::from_millis(5),
            verify_delay: Duration::from_millis(5),
            insert_base_delay: Duration::from_millis(5),
            fk_base_delay: Duration::from_millis(10),
            ..Self::default()
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// What provisioning produced. Reaching this type at all means the account
/// exists; only account creation itself can fail the signup.
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    pub account_id: UserId,

    /// Live session unless the gateway held it for email confirmation
    pub session: Option<Session>,

    /// Best classification of the profile row at return time
    pub profile_status: ProfilePresence,

    /// Set when the profile could not be confirmed or created; the account
    /// is still usable and the row self-heals on first profile save
    pub warning: Option<String>,
}

// =============================================================================
// Step errors
// =============================================================================

#[derive(Debug, Error)]
enum RpcAttemptError {
    #[error("{0}")]
    Backend(SupabaseError),

    #[error("helper reported failure: {0}")]
    Unsuccessful(Value),
}

// Every helper failure is worth another attempt; exhaustion falls through
// to the next stage instead of raising.
impl Retryable for RpcAttemptError {}

#[derive(Debug, Error)]
enum VerifyAttemptError {
    #[error("{0}")]
    Backend(SupabaseError),

    #[error("profile row not visible yet")]
    NotYetVisible,
}

impl Retryable for VerifyAttemptError {}

#[derive(Debug, Error)]
enum InsertAttemptError {
    /// Unique violation: the trigger won the race. Terminal success.
    #[error("profile row already present")]
    AlreadyPresent,

    /// Foreign-key violation: the account row is not visible to the row
    /// store yet. Worth waiting longer than the standard backoff.
    #[error("account not visible to row store: {message}")]
    AccountNotVisible { message: String, backoff: Duration },

    #[error("{0}")]
    Backend(SupabaseError),
}

impl Retryable for InsertAttemptError {
    fn is_retryable(&self) -> bool {
        !matches!(self, InsertAttemptError::AlreadyPresent)
    }

    fn delay_override(&self, attempt: u32) -> Option<Duration> {
        match self {
            InsertAttemptError::AccountNotVisible { backoff, .. } => {
                Some(backoff.saturating_mul(attempt))
            }
            _ => None,
        }
    }
}

/// The helper's payload must affirmatively report success; anything else
/// (missing flag, false, null) counts as a failed attempt.
fn rpc_reports_success(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool) == Some(true)
}

fn strongest(a: ProfilePresence, b: ProfilePresence) -> ProfilePresence {
    fn rank(p: ProfilePresence) -> u8 {
        match p {
            ProfilePresence::Confirmed => 2,
            ProfilePresence::LikelyPresent => 1,
            ProfilePresence::Absent => 0,
        }
    }
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

// =============================================================================
// Sequencer
// =============================================================================

/// Runs the provisioning sequence for new signups.
pub struct AccountProvisioner {
    client: SupabaseClient,
    profiles: ProfileRepository,
    config: SequencerConfig,
}

impl AccountProvisioner {
    pub fn new(client: SupabaseClient) -> Self {
        Self::with_config(client, SequencerConfig::default())
    }

    pub fn with_config(client: SupabaseClient, config: SequencerConfig) -> Self {
        let profiles = ProfileRepository::new(client.clone());
        Self {
            client,
            profiles,
            config,
        }
    }

    /// Create an account and see its profile row provisioned.
    ///
    /// Fails only when the gateway rejects the signup itself (duplicate
    /// email, weak password) or cannot be reached. Provisioning trouble
    /// after that point degrades to `profile_status` / `warning` on the
    /// returned outcome.
    pub async fn provision(&self, request: &SignUpRequest) -> AppResult<ProvisioningOutcome> {
        request.validate()?;

        let signup = self.client.sign_up(request).await.map_err(|e| match e {
            SupabaseError::SignupRejected(msg) => AppError::SignupRejected(msg),
            other => AppError::Backend(other),
        })?;
        let account_id = signup.user.id.clone();
        info!("Created account {} with role {}", account_id, request.role);

        tokio::time::sleep(self.config.settle_delay).await;

        // Helper procedure first; a confirmed run settles provisioning.
        let mut verified = if self.attempt_rpc(&account_id, request).await {
            ProfilePresence::Confirmed
        } else {
            ProfilePresence::Absent
        };

        if verified != ProfilePresence::Confirmed {
            verified = self.poll_existence(&account_id).await;
        }

        if verified == ProfilePresence::Absent {
            verified = self.fallback_insert(&account_id, request).await;
        }

        let final_read = self.final_check(&account_id).await;
        let profile_status = strongest(verified, final_read);

        let warning = match profile_status {
            ProfilePresence::Absent => {
                warn!(
                    "Account {} created but its profile could not be provisioned",
                    account_id
                );
                Some(
                    "Your account was created, but profile setup did not finish. \
                     Saving your profile will complete it."
                        .to_string(),
                )
            }
            ProfilePresence::LikelyPresent => {
                info!(
                    "Profile for {} assumed present behind a blocked read",
                    account_id
                );
                None
            }
            ProfilePresence::Confirmed => None,
        };

        Ok(ProvisioningOutcome {
            account_id,
            session: signup.session,
            profile_status,
            warning,
        })
    }

    /// Helper-procedure stage: ask the backend to create the row.
    async fn attempt_rpc(&self, account_id: &UserId, request: &SignUpRequest) -> bool {
        let config = RetryConfig::new("provision_rpc")
            .with_max_attempts(self.config.rpc_attempts)
            .with_base_delay(self.config.rpc_base_delay)
            .with_backoff(Backoff::Linear);

        let args = json!({
            "user_id": account_id,
            "user_email": request.email,
            "user_role": request.role,
            "first_name": request.first_name,
            "last_name": request.last_name,
        });

        let result = retry_async(&config, || async {
            let value = self
                .client
                .rpc(SIGNUP_RPC, &args)
                .await
                .map_err(RpcAttemptError::Backend)?;
            if rpc_reports_success(&value) {
                Ok(())
            } else {
                Err(RpcAttemptError::Unsuccessful(value))
            }
        })
        .await;

        match result {
            RetryResult::Success(()) => {
                info!("Provisioning helper created profile for {}", account_id);
                true
            }
            RetryResult::Failed { error, attempts } => {
                warn!(
                    "Provisioning helper gave up after {} attempts: {}",
                    attempts, error
                );
                false
            }
        }
    }

    /// Poll stage: look for the row, treating a blocked read as presence.
    async fn poll_existence(&self, account_id: &UserId) -> ProfilePresence {
        let config = RetryConfig::new("provision_verify")
            .with_max_attempts(self.config.verify_attempts)
            .with_base_delay(self.config.verify_delay)
            .with_backoff(Backoff::Fixed);

        let result = retry_async(&config, || async {
            match self.profiles.verify_presence(account_id).await {
                Ok(ProfilePresence::Absent) => Err(VerifyAttemptError::NotYetVisible),
                Ok(presence) => Ok(presence),
                Err(e) => Err(VerifyAttemptError::Backend(e)),
            }
        })
        .await;

        match result {
            RetryResult::Success(presence) => presence,
            RetryResult::Failed { attempts, .. } => {
                debug!(
                    "Profile for {} not visible after {} reads",
                    account_id, attempts
                );
                ProfilePresence::Absent
            }
        }
    }

    /// Insert stage: create the row ourselves when nothing else confirmed it.
    async fn fallback_insert(
        &self,
        account_id: &UserId,
        request: &SignUpRequest,
    ) -> ProfilePresence {
        let config = RetryConfig::new("provision_insert")
            .with_max_attempts(self.config.insert_attempts)
            .with_base_delay(self.config.insert_base_delay)
            .with_backoff(Backoff::Linear);

        let row = NewProfile::from_signup(account_id.clone(), request);
        let fk_backoff = self.config.fk_base_delay;

        let result = retry_async(&config, || async {
            match self.profiles.insert(&row).await {
                Ok(_) => Ok(()),
                Err(SupabaseError::UniqueViolation(_)) => Err(InsertAttemptError::AlreadyPresent),
                Err(SupabaseError::ForeignKeyViolation(msg)) => {
                    Err(InsertAttemptError::AccountNotVisible {
                        message: msg,
                        backoff: fk_backoff,
                    })
                }
                Err(e) => Err(InsertAttemptError::Backend(e)),
            }
        })
        .await;

        match result {
            RetryResult::Success(()) => {
                info!("Fallback insert created profile for {}", account_id);
                ProfilePresence::Confirmed
            }
            RetryResult::Failed {
                error: InsertAttemptError::AlreadyPresent,
                ..
            } => {
                info!("Profile for {} was created concurrently", account_id);
                ProfilePresence::Confirmed
            }
            RetryResult::Failed {
                error: InsertAttemptError::AccountNotVisible { message, .. },
                attempts,
            } => {
                // The account undeniably exists; the row store just has not
                // seen it yet. Accept optimistically.
                warn!(
                    "Insert for {} still blocked on the account key after {} attempts: {}",
                    account_id, attempts, message
                );
                ProfilePresence::LikelyPresent
            }
            RetryResult::Failed { error, attempts } => {
                warn!(
                    "Fallback insert for {} gave up after {} attempts: {}",
                    account_id, attempts, error
                );
                ProfilePresence::Absent
            }
        }
    }

    /// One last read to decide the reported status. Never raises.
    async fn final_check(&self, account_id: &UserId) -> ProfilePresence {
        match self.profiles.verify_presence(account_id).await {
            Ok(presence) => presence,
            Err(e) => {
                warn!("Final provisioning check for {} failed: {}", account_id, e);
                ProfilePresence::Absent
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_success_requires_true_flag() {
        assert!(rpc_reports_success(&json!({ "success": true })));
        assert!(!rpc_reports_success(&json!({ "success": false })));
        assert!(!rpc_reports_success(&json!({ "success": "yes" })));
        assert!(!rpc_reports_success(&json!({ "created": true })));
        assert!(!rpc_reports_success(&Value::Null));
    }

    #[test]
    fn test_strongest_ranks_confirmed_over_blocked_over_absent() {
        use ProfilePresence::*;
        assert_eq!(strongest(Confirmed, Absent), Confirmed);
        assert_eq!(strongest(Absent, Confirmed), Confirmed);
        assert_eq!(strongest(LikelyPresent, Absent), LikelyPresent);
        assert_eq!(strongest(Absent, Absent), Absent);
        assert_eq!(strongest(Confirmed, LikelyPresent), Confirmed);
    }

    #[test]
    fn test_unique_violation_is_not_retried() {
        assert!(!InsertAttemptError::AlreadyPresent.is_retryable());
        let blocked = InsertAttemptError::AccountNotVisible {
            message: "fk".to_string(),
            backoff: Duration::from_secs(2),
        };
        assert!(blocked.is_retryable());
    }

    #[test]
    fn test_blocked_insert_waits_longer_each_attempt() {
        let blocked = InsertAttemptError::AccountNotVisible {
            message: "fk".to_string(),
            backoff: Duration::from_secs(2),
        };
        assert_eq!(blocked.delay_override(1), Some(Duration::from_secs(2)));
        assert_eq!(blocked.delay_override(2), Some(Duration::from_secs(4)));
        assert_eq!(
            InsertAttemptError::AlreadyPresent.delay_override(1),
            None
        );
    }

    #[test]
    fn test_default_budgets_match_fast_budgets() {
        let default = SequencerConfig::default();
        let fast = SequencerConfig::fast();
        assert_eq!(default.rpc_attempts, fast.rpc_attempts);
        assert_eq!(default.verify_attempts, fast.verify_attempts);
        assert_eq!(default.insert_attempts, fast.insert_attempts);
        assert!(fast.settle_delay < default.settle_delay);
    }
}
