//! Application layer for the RadBoard client.
//!
//! Everything a page needs sits here: session state and guards, the signup
//! provisioning sequence, and the job, application, and profile services
//! that put ownership and pipeline rules on top of the raw repositories.
//!
//! Pages stay thin. They clone a [`SessionContext`], ask [`guard_page`] who
//! is allowed in, and call one service method per user action.

pub mod applications;
pub mod error;
pub mod guard;
pub mod jobs;
pub mod profile;
pub mod provision;
pub mod retry;
pub mod session;

// Re-export common types
pub use applications::ApplicationService;
pub use error::{AppError, AppResult};
pub use guard::{evaluate, guard_page, GuardOutcome, RedirectTarget};
pub use jobs::JobService;
pub use profile::ProfileService;
pub use provision::{AccountProvisioner, ProvisioningOutcome, SequencerConfig};
pub use retry::{retry_async, Backoff, RetryConfig, RetryResult, Retryable};
pub use session::{SessionContext, SessionSnapshot};
