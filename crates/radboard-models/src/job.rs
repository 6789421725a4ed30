//! Job posting models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::profile::UserId;

/// Unique identifier for a job posting. Minted by the row store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Posting lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Visible on the board, accepting applications
    #[default]
    Active,
    /// No longer accepting applications
    Closed,
    /// Saved by the employer, not yet published
    Draft,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    OnSite,
    Remote,
    Hybrid,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::OnSite => "on_site",
            WorkType::Remote => "remote",
            WorkType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract shape of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    PerDiem,
    Travel,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::PerDiem => "per_diem",
            EmploymentType::Travel => "travel",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit the pay range is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    #[default]
    Hourly,
    Weekly,
    Annual,
}

impl PayPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayPeriod::Hourly => "hourly",
            PayPeriod::Weekly => "weekly",
            PayPeriod::Annual => "annual",
        }
    }
}

/// Shift slots a posting covers (and techs prefer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Day,
    Evening,
    Night,
    Weekend,
    Rotating,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Evening => "evening",
            ShiftType::Night => "night",
            ShiftType::Weekend => "weekend",
            ShiftType::Rotating => "rotating",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job posting row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: JobId,

    /// Owning employer account
    pub employer_id: UserId,

    pub title: String,

    /// Display location ("Dallas, TX")
    pub location: String,

    /// Street address as resolved by the mapping service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    pub work_type: WorkType,

    pub employment_type: EmploymentType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_max: Option<f64>,

    #[serde(default)]
    pub pay_period: PayPeriod,

    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub benefits: Vec<String>,

    #[serde(default)]
    pub shifts: Vec<ShiftType>,

    #[serde(default)]
    pub status: JobStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Active
    }

    /// Coordinates when the posting was geocoded.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Insert payload for a new posting. The row store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct NewJob {
    pub employer_id: UserId,

    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    pub work_type: WorkType,

    pub employment_type: EmploymentType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_max: Option<f64>,

    #[serde(default)]
    pub pay_period: PayPeriod,

    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub benefits: Vec<String>,

    #[serde(default)]
    pub shifts: Vec<ShiftType>,

    #[serde(default)]
    pub status: JobStatus,
}

impl NewJob {
    /// Pay bounds are optional but must be ordered when both are given.
    pub fn pay_range_is_ordered(&self) -> bool {
        match (self.pay_min, self.pay_max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Partial update for an existing posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_period: Option<PayPeriod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts: Option<Vec<ShiftType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

/// A posting joined with employer display data and the viewer's distance,
/// assembled in memory for the browse page.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Distance from the viewer's location, when both sides are geocoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl JobListing {
    pub fn from_job(job: Job) -> Self {
        Self {
            job,
            company_name: None,
            distance_km: None,
        }
    }
}
