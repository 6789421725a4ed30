//! Account profile models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::job::ShiftType;

/// Unique identifier for an account and its profile row.
///
/// The auth gateway mints this id at signup; the profile row reuses it as its
/// primary key, which is what makes provisioning retries idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which side of the board an account belongs to.
///
/// Picked once at signup and never changed afterwards; no update payload in
/// this crate carries a role field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Radiologic technologist looking for work
    Tech,
    /// Employer posting jobs
    Employer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tech => "tech",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signup form payload, validated before the auth gateway is called.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct SignUpRequest {
    #[validate(email(message = "a valid email address is required"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,

    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
}

/// Base profile row shared by both roles.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    /// Account id (auth gateway user id)
    pub id: UserId,

    /// Contact email, copied from the account at provisioning time
    pub email: String,

    /// Account role
    pub role: Role,

    pub first_name: String,

    pub last_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Free-form home location ("Austin, TX")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for the manual provisioning fallback.
///
/// Only the columns the signup form knows; everything else comes from column
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewProfile {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl NewProfile {
    /// Build the insert payload from a freshly created account.
    pub fn from_signup(account_id: UserId, request: &SignUpRequest) -> Self {
        Self {
            id: account_id,
            email: request.email.clone(),
            role: request.role,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
        }
    }
}

/// Partial update for the base profile row.
///
/// `id`, `email`, and `role` are deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// True when no field is set; used to skip no-op PATCH calls.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
    }
}

/// Tech-side profile details, keyed by the account id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TechProfile {
    pub id: UserId,

    #[serde(default)]
    pub certifications: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<i32>,

    #[serde(default)]
    pub specializations: Vec<String>,

    #[serde(default)]
    pub preferred_shifts: Vec<ShiftType>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for tech details; creates the row on first save.
///
/// Fields are serialized even when null so a cleared value clears the column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TechProfileUpsert {
    pub id: UserId,
    pub certifications: Vec<String>,
    pub years_experience: Option<i32>,
    pub specializations: Vec<String>,
    pub preferred_shifts: Vec<ShiftType>,
}

/// Employer-side profile details, keyed by the account id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmployerProfile {
    pub id: UserId,

    pub company_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Set by back-office review, never by this client
    #[serde(default)]
    pub verified: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for employer details. `verified` is not settable here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmployerProfileUpsert {
    pub id: UserId,
    pub company_name: String,
    pub company_size: Option<String>,
    pub industry: Option<String>,
}

/// A profile with its role-specific details attached, as returned by the
/// embedded select `*,tech_profiles(*),employer_profiles(*)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfileRecord {
    #[serde(flatten)]
    pub profile: Profile,

    /// Present for tech accounts once the detail row exists
    #[serde(default, rename = "tech_profiles", skip_serializing_if = "Option::is_none")]
    pub tech: Option<TechProfile>,

    /// Present for employer accounts once the detail row exists
    #[serde(
        default,
        rename = "employer_profiles",
        skip_serializing_if = "Option::is_none"
    )]
    pub employer: Option<EmployerProfile>,
}

impl ProfileRecord {
    /// Wrap a bare profile row fetched without embeds.
    pub fn from_base(profile: Profile) -> Self {
        Self {
            profile,
            tech: None,
            employer: None,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn company_name(&self) -> Option<&str> {
        self.employer.as_ref().map(|e| e.company_name.as_str())
    }
}
