//! Supabase REST client for the RadBoard backend.
//!
//! Talks to the two halves of the hosted platform over plain HTTPS:
//! - the auth gateway for accounts and sessions
//! - the row store for tables and stored procedures
//!
//! Requests carry the project `apikey` plus a bearer token (the session token
//! when signed in, the anon key otherwise); row visibility is then decided by
//! the backend's row security, not by this client.

pub mod auth;
pub mod client;
pub mod error;
pub mod metrics;
pub mod query;
pub mod repos;


// Re-export common types
pub use auth::{AuthUser, Session, SignUpOutcome, UserMetadata};
pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{codes, SupabaseError, SupabaseResult};
pub use query::{Filter, Order};
pub use repos::{
    tables, ApplicationRepository, JobRepository, ProfilePresence, ProfileRepository,
};
