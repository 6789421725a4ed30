//! In-memory filters for the browse pages.
//!
//! List pages fetch their rows once and narrow them client-side. Active
//! fields combine with AND; an unset or blank field never excludes a row.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationListing, ApplicationStatus};
use crate::job::{EmploymentType, JobListing, JobStatus, WorkType};

/// Lowercased, trimmed search needle; None when there is nothing to match.
fn search_needle(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn field_contains(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

/// Filters for the job browse page and the employer's posting list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobFilters {
    /// Free-text search over title, location, and company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
}

impl JobFilters {
    pub fn is_empty(&self) -> bool {
        search_needle(&self.search).is_none()
            && self.status.is_none()
            && self.work_type.is_none()
            && self.employment_type.is_none()
    }

    pub fn matches(&self, listing: &JobListing) -> bool {
        if let Some(needle) = search_needle(&self.search) {
            let company = listing.company_name.as_deref().unwrap_or("");
            let hit = field_contains(&listing.job.title, &needle)
                || field_contains(&listing.job.location, &needle)
                || field_contains(company, &needle);
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if listing.job.status != status {
                return false;
            }
        }
        if let Some(work_type) = self.work_type {
            if listing.job.work_type != work_type {
                return false;
            }
        }
        if let Some(employment_type) = self.employment_type {
            if listing.job.employment_type != employment_type {
                return false;
            }
        }
        true
    }

    /// Narrow a fetched page of listings in place.
    pub fn apply(&self, mut listings: Vec<JobListing>) -> Vec<JobListing> {
        listings.retain(|listing| self.matches(listing));
        listings
    }
}

/// Filters for the application lists on both sides of the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationFilters {
    /// Free-text search over job title, company, and applicant name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilters {
    pub fn is_empty(&self) -> bool {
        search_needle(&self.search).is_none() && self.status.is_none()
    }

    pub fn matches(&self, listing: &ApplicationListing) -> bool {
        if let Some(needle) = search_needle(&self.search) {
            let job_title = listing.job_title.as_deref().unwrap_or("");
            let company = listing.company_name.as_deref().unwrap_or("");
            let applicant = listing.applicant_name.as_deref().unwrap_or("");
            let hit = field_contains(job_title, &needle)
                || field_contains(company, &needle)
                || field_contains(applicant, &needle);
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if listing.application.status != status {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, mut listings: Vec<ApplicationListing>) -> Vec<ApplicationListing> {
        listings.retain(|listing| self.matches(listing));
        listings
    }
}
