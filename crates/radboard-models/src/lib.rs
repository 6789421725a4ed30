//! Shared data models for the RadBoard platform.
//!
//! This crate provides Serde-serializable types for:
//! - Accounts, profiles, and role-specific profile details
//! - Job postings and their lifecycle
//! - Job applications and the review pipeline
//! - In-memory filters shared by the browse pages

pub mod application;
pub mod filter;
pub mod job;
pub mod profile;

// Re-export common types
pub use application::{
    ApplicationId, ApplicationListing, ApplicationStatus, JobApplication, NewApplication,
};
pub use filter::{ApplicationFilters, JobFilters};
pub use job::{
    EmploymentType, Job, JobId, JobListing, JobStatus, JobUpdate, NewJob, PayPeriod, ShiftType,
    WorkType,
};
pub use profile::{
    EmployerProfile, EmployerProfileUpsert, NewProfile, Profile, ProfileRecord, ProfileUpdate,
    Role, SignUpRequest, TechProfile, TechProfileUpsert, UserId,
};
