//! Application error types.
//!
//! Everything a page surfaces to the user lands here. Backend errors pass
//! through transparently; the named variants are the outcomes pages branch
//! on for messaging.

use thiserror::Error;

use radboard_models::ApplicationStatus;
use radboard_supabase::SupabaseError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Signup rejected: {0}")]
    SignupRejected(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Already applied to this job")]
    AlreadyApplied,

    #[error("Cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] SupabaseError),
}

impl AppError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}
