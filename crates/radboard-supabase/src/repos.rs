//! Typed repositories over the row-store tables.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use radboard_models::{
    ApplicationId, ApplicationStatus, EmployerProfile, EmployerProfileUpsert, Job, JobApplication,
    JobId, JobStatus, JobUpdate, NewApplication, NewJob, NewProfile, Profile, ProfileRecord,
    ProfileUpdate, TechProfile, TechProfileUpsert, UserId,
};

use crate::client::SupabaseClient;
use crate::error::{SupabaseError, SupabaseResult};
use crate::query::{Filter, Order};

/// Table names.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const TECH_PROFILES: &str = "tech_profiles";
    pub const EMPLOYER_PROFILES: &str = "employer_profiles";
    pub const JOBS: &str = "jobs";
    pub const JOB_APPLICATIONS: &str = "job_applications";
}

/// Embedded select for a profile with its role details attached.
const PROFILE_RECORD_SELECT: &str = "*,tech_profiles(*),employer_profiles(*)";

// =============================================================================
// Profile presence
// =============================================================================

/// How a profile-existence probe came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePresence {
    /// Row read back successfully
    Confirmed,
    /// Read was blocked or ambiguous; right after signup that almost always
    /// means the row exists but policy hides it from its own creator
    LikelyPresent,
    /// Clean empty read, no row yet
    Absent,
}

/// Classify a probe response. Blocked-read signatures count as presence;
/// anything else propagates so the caller's retry loop can see it.
fn classify_probe<T>(result: SupabaseResult<Vec<T>>) -> SupabaseResult<ProfilePresence> {
    match result {
        Ok(rows) if !rows.is_empty() => Ok(ProfilePresence::Confirmed),
        Ok(_) => Ok(ProfilePresence::Absent),
        Err(SupabaseError::RowAmbiguity(_)) | Err(SupabaseError::PermissionDenied(_)) => {
            Ok(ProfilePresence::LikelyPresent)
        }
        Err(err) => Err(err),
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Repository for profile rows and their role-specific details.
#[derive(Clone)]
pub struct ProfileRepository {
    client: SupabaseClient,
}

impl ProfileRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a profile by account id. Missing rows are a normal outcome.
    pub async fn fetch(&self, id: &UserId) -> SupabaseResult<Option<Profile>> {
        let rows: Vec<Profile> = self
            .client
            .select_rows(
                tables::PROFILES,
                None,
                &[Filter::eq("id", id.as_str())],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Get a profile with its tech/employer details embedded.
    pub async fn fetch_record(&self, id: &UserId) -> SupabaseResult<Option<ProfileRecord>> {
        let rows: Vec<ProfileRecord> = self
            .client
            .select_rows(
                tables::PROFILES,
                Some(PROFILE_RECORD_SELECT),
                &[Filter::eq("id", id.as_str())],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Existence probe used by provisioning.
    ///
    /// A clean empty read means the row is not there yet; a blocked or
    /// ambiguous read counts as likely-present rather than missing.
    pub async fn verify_presence(&self, id: &UserId) -> SupabaseResult<ProfilePresence> {
        let result: SupabaseResult<Vec<Profile>> = self
            .client
            .select_rows(
                tables::PROFILES,
                None,
                &[Filter::eq("id", id.as_str())],
                None,
                Some(1),
            )
            .await;
        classify_probe(result)
    }

    /// Insert the base profile row (manual provisioning fallback).
    pub async fn insert(&self, row: &NewProfile) -> SupabaseResult<Profile> {
        let stored: Profile = self.client.insert_row(tables::PROFILES, row).await?;
        info!("Created profile row for account {}", row.id);
        Ok(stored)
    }

    /// Insert-or-update the base profile row on its primary key.
    pub async fn upsert(&self, row: &NewProfile) -> SupabaseResult<Profile> {
        let stored: Profile = self.client.upsert_row(tables::PROFILES, row).await?;
        Ok(stored)
    }

    /// Patch base profile fields.
    pub async fn update(&self, id: &UserId, changes: &ProfileUpdate) -> SupabaseResult<Profile> {
        let rows: Vec<Profile> = self
            .client
            .update_rows(tables::PROFILES, &[Filter::eq("id", id.as_str())], changes)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::not_found(format!("profile {}", id)))
    }

    /// Create-or-replace tech details; first profile save creates the row.
    pub async fn upsert_tech(&self, row: &TechProfileUpsert) -> SupabaseResult<TechProfile> {
        let stored: TechProfile = self.client.upsert_row(tables::TECH_PROFILES, row).await?;
        info!("Saved tech details for account {}", row.id);
        Ok(stored)
    }

    /// Create-or-replace employer details; first profile save creates the row.
    pub async fn upsert_employer(
        &self,
        row: &EmployerProfileUpsert,
    ) -> SupabaseResult<EmployerProfile> {
        let stored: EmployerProfile = self
            .client
            .upsert_row(tables::EMPLOYER_PROFILES, row)
            .await?;
        info!("Saved employer details for account {}", row.id);
        Ok(stored)
    }

    /// Company names for a set of employer accounts, for list display.
    pub async fn company_names(&self, ids: &[UserId]) -> SupabaseResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        #[derive(Deserialize)]
        struct CompanyRow {
            id: UserId,
            company_name: String,
        }

        let id_strings: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let rows: Vec<CompanyRow> = self
            .client
            .select_rows(
                tables::EMPLOYER_PROFILES,
                Some("id,company_name"),
                &[Filter::is_in("id", &id_strings)],
                None,
                None,
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id.0, row.company_name))
            .collect())
    }

    /// Display names for a set of accounts, for list display.
    pub async fn display_names(&self, ids: &[UserId]) -> SupabaseResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        #[derive(Deserialize)]
        struct NameRow {
            id: UserId,
            first_name: String,
            last_name: String,
        }

        let id_strings: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let rows: Vec<NameRow> = self
            .client
            .select_rows(
                tables::PROFILES,
                Some("id,first_name,last_name"),
                &[Filter::is_in("id", &id_strings)],
                None,
                None,
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id.0, format!("{} {}", row.first_name, row.last_name)))
            .collect())
    }
}

// =============================================================================
// Jobs
// =============================================================================

/// Repository for job postings.
pub struct JobRepository {
    client: SupabaseClient,
}

impl JobRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// All open postings, newest first.
    pub async fn list_open(&self) -> SupabaseResult<Vec<Job>> {
        self.client
            .select_rows(
                tables::JOBS,
                None,
                &[Filter::eq("status", JobStatus::Active.as_str())],
                Some(&Order::desc("created_at")),
                None,
            )
            .await
    }

    /// Every posting owned by an employer, newest first.
    pub async fn list_for_employer(&self, employer_id: &UserId) -> SupabaseResult<Vec<Job>> {
        self.client
            .select_rows(
                tables::JOBS,
                None,
                &[Filter::eq("employer_id", employer_id.as_str())],
                Some(&Order::desc("created_at")),
                None,
            )
            .await
    }

    /// Fetch a set of postings by id, for joining application lists.
    pub async fn list_by_ids(&self, ids: &[JobId]) -> SupabaseResult<Vec<Job>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        self.client
            .select_rows(
                tables::JOBS,
                None,
                &[Filter::is_in("id", &id_strings)],
                None,
                None,
            )
            .await
    }

    /// Get a posting by id.
    pub async fn get(&self, id: &JobId) -> SupabaseResult<Option<Job>> {
        let rows: Vec<Job> = self
            .client
            .select_rows(
                tables::JOBS,
                None,
                &[Filter::eq("id", id.as_str())],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Create a posting and return the stored row.
    pub async fn create(&self, posting: &NewJob) -> SupabaseResult<Job> {
        let stored: Job = self.client.insert_row(tables::JOBS, posting).await?;
        info!("Created job {} for employer {}", stored.id, stored.employer_id);
        Ok(stored)
    }

    /// Patch a posting.
    pub async fn update(&self, id: &JobId, changes: &JobUpdate) -> SupabaseResult<Job> {
        let rows: Vec<Job> = self
            .client
            .update_rows(tables::JOBS, &[Filter::eq("id", id.as_str())], changes)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::not_found(format!("job {}", id)))
    }

    /// Move a posting through its lifecycle (active / closed / draft).
    pub async fn set_status(&self, id: &JobId, status: JobStatus) -> SupabaseResult<Job> {
        let rows: Vec<Job> = self
            .client
            .update_rows(
                tables::JOBS,
                &[Filter::eq("id", id.as_str())],
                &json!({ "status": status }),
            )
            .await?;
        let stored = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::not_found(format!("job {}", id)))?;
        info!("Job {} is now {}", stored.id, stored.status);
        Ok(stored)
    }

    /// Delete a posting.
    pub async fn delete(&self, id: &JobId) -> SupabaseResult<()> {
        self.client
            .delete_rows(tables::JOBS, &[Filter::eq("id", id.as_str())])
            .await?;
        info!("Deleted job {}", id);
        Ok(())
    }
}

// =============================================================================
// Applications
// =============================================================================

/// Repository for job applications.
pub struct ApplicationRepository {
    client: SupabaseClient,
}

impl ApplicationRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Submit an application and return the stored row.
    pub async fn create(&self, application: &NewApplication) -> SupabaseResult<JobApplication> {
        let stored: JobApplication = self
            .client
            .insert_row(tables::JOB_APPLICATIONS, application)
            .await?;
        info!(
            "Application {} submitted for job {}",
            stored.id, stored.job_id
        );
        Ok(stored)
    }

    /// Whether this tech already applied to this job.
    pub async fn exists(&self, job_id: &JobId, tech_id: &UserId) -> SupabaseResult<bool> {
        #[derive(Deserialize)]
        struct IdRow {
            #[allow(dead_code)]
            id: ApplicationId,
        }

        let rows: Vec<IdRow> = self
            .client
            .select_rows(
                tables::JOB_APPLICATIONS,
                Some("id"),
                &[
                    Filter::eq("job_id", job_id.as_str()),
                    Filter::eq("tech_id", tech_id.as_str()),
                ],
                None,
                Some(1),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Get an application by id.
    pub async fn get(&self, id: &ApplicationId) -> SupabaseResult<Option<JobApplication>> {
        let rows: Vec<JobApplication> = self
            .client
            .select_rows(
                tables::JOB_APPLICATIONS,
                None,
                &[Filter::eq("id", id.as_str())],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Everything a tech has applied to, newest first.
    pub async fn list_for_tech(&self, tech_id: &UserId) -> SupabaseResult<Vec<JobApplication>> {
        self.client
            .select_rows(
                tables::JOB_APPLICATIONS,
                None,
                &[Filter::eq("tech_id", tech_id.as_str())],
                Some(&Order::desc("applied_at")),
                None,
            )
            .await
    }

    /// All applications for one posting, oldest first for review order.
    pub async fn list_for_job(&self, job_id: &JobId) -> SupabaseResult<Vec<JobApplication>> {
        self.client
            .select_rows(
                tables::JOB_APPLICATIONS,
                None,
                &[Filter::eq("job_id", job_id.as_str())],
                Some(&Order::asc("applied_at")),
                None,
            )
            .await
    }

    /// Move an application through the review pipeline.
    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> SupabaseResult<JobApplication> {
        let rows: Vec<JobApplication> = self
            .client
            .update_rows(
                tables::JOB_APPLICATIONS,
                &[Filter::eq("id", id.as_str())],
                &json!({ "status": status }),
            )
            .await?;
        let stored = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::not_found(format!("application {}", id)))?;
        info!("Application {} is now {}", stored.id, stored.status);
        Ok(stored)
    }
}

// =============================================================================
// Tests
// =============================================================================
