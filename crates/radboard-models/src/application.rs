//! Job application models and the review pipeline.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobId;
use crate::profile::UserId;

/// Unique identifier for an application. Minted by the row store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where an application sits in the employer's review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, not yet looked at
    #[default]
    Pending,
    /// Employer has reviewed the application
    Reviewed,
    /// Candidate invited to interview
    Interview,
    /// Position offered and accepted
    Hired,
    /// Passed on
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// Whether the pipeline allows moving from `self` to `next`.
    ///
    /// Review advances one step at a time; rejection is allowed from any
    /// non-terminal stage.
    pub fn can_advance_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewed)
                | (Reviewed, Interview)
                | (Interview, Hired)
                | (Pending | Reviewed | Interview, Rejected)
        )
    }

    /// Legal next stages, in the order the review page offers them.
    pub fn next_steps(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewed, Rejected],
            Reviewed => &[Interview, Rejected],
            Interview => &[Hired, Rejected],
            Hired | Rejected => &[],
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job application row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobApplication {
    pub id: ApplicationId,

    pub job_id: JobId,

    /// Applying tech account
    pub tech_id: UserId,

    #[serde(default)]
    pub status: ApplicationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,

    pub applied_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new application. Status starts at `pending` via the
/// column default; one application per (job, tech) pair is enforced by a
/// unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewApplication {
    pub job_id: JobId,

    pub tech_id: UserId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

/// An application joined with display fields for list pages: the tech's view
/// wants the job, the employer's view wants the applicant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationListing {
    #[serde(flatten)]
    pub application: JobApplication,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_name: Option<String>,
}

impl ApplicationListing {
    pub fn from_application(application: JobApplication) -> Self {
        Self {
            application,
            job_title: None,
            company_name: None,
            applicant_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_advances_one_step() {
        use ApplicationStatus::*;
        assert!(Pending.can_advance_to(Reviewed));
        assert!(Reviewed.can_advance_to(Interview));
        assert!(Interview.can_advance_to(Hired));
        assert!(!Pending.can_advance_to(Interview));
        assert!(!Pending.can_advance_to(Hired));
        assert!(!Reviewed.can_advance_to(Hired));
    }

    #[test]
    fn test_rejection_allowed_from_any_open_stage() {
        use ApplicationStatus::*;
        assert!(Pending.can_advance_to(Rejected));
        assert!(Reviewed.can_advance_to(Rejected));
        assert!(Interview.can_advance_to(Rejected));
    }

    #[test]
    fn test_terminal_stages_do_not_move() {
        use ApplicationStatus::*;
        for next in [Pending, Reviewed, Interview, Hired, Rejected] {
            assert!(!Hired.can_advance_to(next));
            assert!(!Rejected.can_advance_to(next));
        }
        assert!(Hired.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Interview.is_terminal());
    }

    #[test]
    fn test_next_steps_match_can_advance_to() {
        use ApplicationStatus::*;
        for from in [Pending, Reviewed, Interview, Hired, Rejected] {
            for next in [Pending, Reviewed, Interview, Hired, Rejected] {
                let offered = from.next_steps().contains(&next);
                assert_eq!(offered, from.can_advance_to(next));
            }
        }
    }

    #[test]
    fn test_status_default_is_pending() {
        let body = serde_json::json!({
            "id": "a-1",
            "job_id": "j-1",
            "tech_id": "t-1",
            "applied_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:00:00Z"
        });
        let row: JobApplication = serde_json::from_value(body).unwrap();
        assert_eq!(row.status, ApplicationStatus::Pending);
        assert!(row.cover_letter.is_none());
    }
}
