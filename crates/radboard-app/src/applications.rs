//! Application pipeline: techs apply, employers review.

use std::collections::HashMap;

use radboard_models::{
    ApplicationId, ApplicationListing, ApplicationStatus, Job, JobApplication, JobId,
    NewApplication, UserId,
};
use radboard_supabase::{
    ApplicationRepository, JobRepository, ProfileRepository, SupabaseClient, SupabaseError,
};

use crate::error::{AppError, AppResult};

/// Application reads and writes, with the ownership and pipeline rules the
/// row store cannot express on its own.
pub struct ApplicationService {
    applications: ApplicationRepository,
    jobs: JobRepository,
    profiles: ProfileRepository,
}

impl ApplicationService {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            applications: ApplicationRepository::new(client.clone()),
            jobs: JobRepository::new(client.clone()),
            profiles: ProfileRepository::new(client),
        }
    }

    // =========================================================================
    // Tech side
    // =========================================================================

    /// Apply to an open posting, once.
    ///
    /// The pre-check keeps the common duplicate path off the error log; the
    /// unique key on (job, tech) still backstops the race when two tabs
    /// submit together.
    pub async fn apply(
        &self,
        tech: &UserId,
        job_id: &JobId,
        cover_letter: Option<String>,
    ) -> AppResult<JobApplication> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("job {}", job_id)))?;
        if !job.is_open() {
            return Err(AppError::forbidden(
                "posting is no longer accepting applications",
            ));
        }

        if self.applications.exists(job_id, tech).await? {
            return Err(AppError::AlreadyApplied);
        }

        let row = NewApplication {
            job_id: job_id.clone(),
            tech_id: tech.clone(),
            cover_letter,
        };
        match self.applications.create(&row).await {
            Ok(stored) => Ok(stored),
            Err(SupabaseError::UniqueViolation(_)) => Err(AppError::AlreadyApplied),
            Err(e) => Err(AppError::Backend(e)),
        }
    }

    /// The tech's applications, newest first, joined with job titles and
    /// company names.
    pub async fn list_for_tech(&self, tech: &UserId) -> AppResult<Vec<ApplicationListing>> {
        let apps = self.applications.list_for_tech(tech).await?;

        let mut job_ids: Vec<JobId> = apps.iter().map(|a| a.job_id.clone()).collect();
        job_ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        job_ids.dedup();
        let jobs = self.jobs.list_by_ids(&job_ids).await?;

        let mut employer_ids: Vec<UserId> =
            jobs.iter().map(|j| j.employer_id.clone()).collect();
        employer_ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        employer_ids.dedup();
        let companies = self.profiles.company_names(&employer_ids).await?;

        let jobs_by_id: HashMap<&str, &Job> =
            jobs.iter().map(|j| (j.id.as_str(), j)).collect();

        let listings = apps
            .into_iter()
            .map(|app| {
                let mut listing = ApplicationListing::from_application(app);
                if let Some(job) = jobs_by_id.get(listing.application.job_id.as_str()) {
                    listing.job_title = Some(job.title.clone());
                    listing.company_name = companies.get(job.employer_id.as_str()).cloned();
                }
                listing
            })
            .collect();
        Ok(listings)
    }

    // =========================================================================
    // Employer side
    // =========================================================================

    /// Applications for one posting the employer owns, oldest first, joined
    /// with applicant names.
    pub async fn list_for_job(
        &self,
        employer: &UserId,
        job_id: &JobId,
    ) -> AppResult<Vec<ApplicationListing>> {
        let job = self.owned_job(employer, job_id).await?;
        let apps = self.applications.list_for_job(job_id).await?;

        let mut tech_ids: Vec<UserId> = apps.iter().map(|a| a.tech_id.clone()).collect();
        tech_ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        tech_ids.dedup();
        let names = self.profiles.display_names(&tech_ids).await?;

        let listings = apps
            .into_iter()
            .map(|app| {
                let mut listing = ApplicationListing::from_application(app);
                listing.job_title = Some(job.title.clone());
                listing.applicant_name =
                    names.get(listing.application.tech_id.as_str()).cloned();
                listing
            })
            .collect();
        Ok(listings)
    }

    /// Move an application through the review pipeline.
    pub async fn update_status(
        &self,
        employer: &UserId,
        id: &ApplicationId,
        next: ApplicationStatus,
    ) -> AppResult<JobApplication> {
        let app = self
            .applications
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("application {}", id)))?;
        self.owned_job(employer, &app.job_id).await?;

        if !app.status.can_advance_to(next) {
            return Err(AppError::InvalidTransition {
                from: app.status,
                to: next,
            });
        }

        Ok(self.applications.update_status(id, next).await?)
    }

    async fn owned_job(&self, employer: &UserId, job_id: &JobId) -> AppResult<Job> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("job {}", job_id)))?;
        if job.employer_id != *employer {
            return Err(AppError::forbidden("posting belongs to another employer"));
        }
        Ok(job)
    }
}
