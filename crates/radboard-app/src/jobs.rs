//! Job board operations: browse for techs, manage for employers.

use tracing::debug;
use validator::Validate;

use radboard_geo::{haversine_km, LocationService};
use radboard_models::{Job, JobId, JobListing, JobStatus, JobUpdate, NewJob, UserId};
use radboard_supabase::{JobRepository, ProfileRepository, SupabaseClient};

use crate::error::{AppError, AppResult};

/// Job reads and writes, with geocoding and display joins on top of the
/// raw rows.
pub struct JobService {
    jobs: JobRepository,
    profiles: ProfileRepository,
    geo: LocationService,
}

impl JobService {
    pub fn new(client: SupabaseClient, geo: LocationService) -> Self {
        Self {
            jobs: JobRepository::new(client.clone()),
            profiles: ProfileRepository::new(client),
            geo,
        }
    }

    // =========================================================================
    // Tech side
    // =========================================================================

    /// Open postings for the browse page, joined with company names and,
    /// when the viewer shared a location, distance to each geocoded posting.
    pub async fn list_open_jobs(
        &self,
        viewer: Option<(f64, f64)>,
    ) -> AppResult<Vec<JobListing>> {
        let jobs = self.jobs.list_open().await?;

        let mut employer_ids: Vec<UserId> = jobs.iter().map(|j| j.employer_id.clone()).collect();
        employer_ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        employer_ids.dedup();
        let names = self.profiles.company_names(&employer_ids).await?;

        let listings = jobs
            .into_iter()
            .map(|job| {
                let mut listing = JobListing::from_job(job);
                listing.company_name = names.get(listing.job.employer_id.as_str()).cloned();
                if let (Some((vlat, vlng)), Some((jlat, jlng))) =
                    (viewer, listing.job.coordinates())
                {
                    listing.distance_km = Some(haversine_km(vlat, vlng, jlat, jlng));
                }
                listing
            })
            .collect();
        Ok(listings)
    }

    /// One posting for the detail page.
    pub async fn get_job(&self, id: &JobId) -> AppResult<Job> {
        self.jobs
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("job {}", id)))
    }

    // =========================================================================
    // Employer side
    // =========================================================================

    /// All postings of one employer, newest first, any status.
    pub async fn list_employer_jobs(&self, employer: &UserId) -> AppResult<Vec<Job>> {
        Ok(self.jobs.list_for_employer(employer).await?)
    }

    /// Publish a posting for the signed-in employer.
    ///
    /// The employer id is stamped from the session, never trusted from the
    /// form. Geocoding is best effort; a posting without a pin is still a
    /// posting.
    pub async fn post_job(&self, employer: &UserId, mut posting: NewJob) -> AppResult<Job> {
        posting.employer_id = employer.clone();
        posting.validate()?;
        if !posting.pay_range_is_ordered() {
            return Err(AppError::invalid_input("pay minimum exceeds pay maximum"));
        }

        if posting.latitude.is_none() || posting.longitude.is_none() {
            let query = posting
                .address
                .clone()
                .unwrap_or_else(|| posting.location.clone());
            match self.geo.geocode(&query).await {
                Ok(place) => {
                    posting.latitude = Some(place.latitude);
                    posting.longitude = Some(place.longitude);
                }
                Err(e) => debug!("No coordinates for \"{}\": {}", query, e),
            }
        }

        Ok(self.jobs.create(&posting).await?)
    }

    /// Patch a posting the signed-in employer owns.
    pub async fn update_job(
        &self,
        employer: &UserId,
        id: &JobId,
        mut changes: JobUpdate,
    ) -> AppResult<Job> {
        self.owned_job(employer, id).await?;

        if let (Some(min), Some(max)) = (changes.pay_min, changes.pay_max) {
            if min > max {
                return Err(AppError::invalid_input("pay minimum exceeds pay maximum"));
            }
        }

        // A moved posting gets a fresh pin unless the form sent one.
        let moved = changes.address.clone().or_else(|| changes.location.clone());
        if let Some(query) = moved {
            if changes.latitude.is_none() || changes.longitude.is_none() {
                match self.geo.geocode(&query).await {
                    Ok(place) => {
                        changes.latitude = Some(place.latitude);
                        changes.longitude = Some(place.longitude);
                    }
                    Err(e) => debug!("No coordinates for \"{}\": {}", query, e),
                }
            }
        }

        Ok(self.jobs.update(id, &changes).await?)
    }

    /// Flip a posting between active, closed, and draft.
    pub async fn set_job_status(
        &self,
        employer: &UserId,
        id: &JobId,
        status: JobStatus,
    ) -> AppResult<Job> {
        self.owned_job(employer, id).await?;
        Ok(self.jobs.set_status(id, status).await?)
    }

    /// Remove a posting outright.
    pub async fn delete_job(&self, employer: &UserId, id: &JobId) -> AppResult<()> {
        self.owned_job(employer, id).await?;
        Ok(self.jobs.delete(id).await?)
    }

    /// Fetch a posting and require the caller to own it.
    pub(crate) async fn owned_job(&self, employer: &UserId, id: &JobId) -> AppResult<Job> {
        let job = self.get_job(id).await?;
        if job.employer_id != *employer {
            return Err(AppError::forbidden("posting belongs to another employer"));
        }
        Ok(job)
    }
}
