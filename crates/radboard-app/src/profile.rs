//! Profile page operations.
//!
//! Saving goes through here rather than straight to the repository because
//! the base row may be missing for accounts whose provisioning never
//! finished. A save against a missing row recreates it from the signup
//! metadata first, so the profile page doubles as the repair path.

use tracing::warn;

use radboard_models::{
    EmployerProfile, EmployerProfileUpsert, NewProfile, Profile, ProfileRecord, ProfileUpdate,
    Role, TechProfile, TechProfileUpsert,
};
use radboard_supabase::{AuthUser, ProfileRepository, SupabaseClient, SupabaseError};

use crate::error::{AppError, AppResult};
use crate::session::SessionSnapshot;

/// Reads and writes profile rows on behalf of the signed-in account.
pub struct ProfileService {
    profiles: ProfileRepository,
}

impl ProfileService {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            profiles: ProfileRepository::new(client),
        }
    }

    /// The full profile record for the page, detail rows included.
    pub async fn fetch_record(&self, user: &AuthUser) -> AppResult<Option<ProfileRecord>> {
        Ok(self.profiles.fetch_record(&user.id).await?)
    }

    /// Patch the base profile row, recreating it when it is missing.
    pub async fn save_base(&self, user: &AuthUser, changes: &ProfileUpdate) -> AppResult<Profile> {
        if changes.is_empty() {
            return match self.profiles.fetch(&user.id).await? {
                Some(profile) => Ok(profile),
                None => self.heal_missing_row(user, changes).await,
            };
        }

        match self.profiles.update(&user.id, changes).await {
            Ok(profile) => Ok(profile),
            Err(SupabaseError::NotFound(_)) => self.heal_missing_row(user, changes).await,
            Err(e) => Err(AppError::Backend(e)),
        }
    }

    /// Create-or-replace the tech detail row for the signed-in tech.
    pub async fn save_tech_details(
        &self,
        session: &SessionSnapshot,
        row: &TechProfileUpsert,
    ) -> AppResult<TechProfile> {
        if session.role() != Some(Role::Tech) {
            return Err(AppError::forbidden("only tech accounts carry tech details"));
        }
        if row.id != *session.account_id() {
            return Err(AppError::forbidden("cannot edit another account's details"));
        }
        Ok(self.profiles.upsert_tech(row).await?)
    }

    /// Create-or-replace the employer detail row for the signed-in employer.
    pub async fn save_employer_details(
        &self,
        session: &SessionSnapshot,
        row: &EmployerProfileUpsert,
    ) -> AppResult<EmployerProfile> {
        if session.role() != Some(Role::Employer) {
            return Err(AppError::forbidden(
                "only employer accounts carry employer details",
            ));
        }
        if row.id != *session.account_id() {
            return Err(AppError::forbidden("cannot edit another account's details"));
        }
        Ok(self.profiles.upsert_employer(row).await?)
    }

    /// Rebuild the base row from the account identity, then apply the edit.
    async fn heal_missing_row(
        &self,
        user: &AuthUser,
        changes: &ProfileUpdate,
    ) -> AppResult<Profile> {
        let row = row_from_identity(user, changes)?;
        warn!("Recreating missing profile row for {}", user.id);
        let stored = self.profiles.upsert(&row).await?;

        if changes.is_empty() {
            return Ok(stored);
        }
        Ok(self.profiles.update(&user.id, changes).await?)
    }
}

/// Seed row for an account whose provisioning hole is being repaired.
/// Names come from the pending edit first, then the signup metadata.
fn row_from_identity(user: &AuthUser, changes: &ProfileUpdate) -> AppResult<NewProfile> {
    let role = user
        .user_metadata
        .role
        .ok_or_else(|| AppError::invalid_input("account has no role on record"))?;
    let email = user
        .email
        .clone()
        .ok_or_else(|| AppError::invalid_input("account has no email on record"))?;

    let meta = &user.user_metadata;
    Ok(NewProfile {
        id: user.id.clone(),
        email,
        role,
        first_name: changes
            .first_name
            .clone()
            .or_else(|| meta.first_name.clone())
            .unwrap_or_default(),
        last_name: changes
            .last_name
            .clone()
            .or_else(|| meta.last_name.clone())
            .unwrap_or_default(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use radboard_models::UserId;
    use radboard_supabase::UserMetadata;

    fn user(role: Option<Role>, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: UserId::from_string("user-9"),
            email: email.map(str::to_string),
            email_confirmed_at: None,
            user_metadata: UserMetadata {
                role,
                first_name: Some("Dana".to_string()),
                last_name: Some("Okafor".to_string()),
            },
            created_at: None,
        }
    }

    #[test]
    fn test_seed_row_uses_signup_metadata() {
        let row = row_from_identity(&user(Some(Role::Tech), Some("d@example.com")), &ProfileUpdate::default())
            .expect("seed row");
        assert_eq!(row.email, "d@example.com");
        assert_eq!(row.role, Role::Tech);
        assert_eq!(row.first_name, "Dana");
        assert_eq!(row.last_name, "Okafor");
    }

    #[test]
    fn test_seed_row_prefers_pending_edit_names() {
        let changes = ProfileUpdate {
            first_name: Some("Danielle".to_string()),
            ..ProfileUpdate::default()
        };
        let row = row_from_identity(&user(Some(Role::Tech), Some("d@example.com")), &changes)
            .expect("seed row");
        assert_eq!(row.first_name, "Danielle");
        assert_eq!(row.last_name, "Okafor");
    }

    #[test]
    fn test_seed_row_requires_role_and_email() {
        let missing_role = row_from_identity(
            &user(None, Some("d@example.com")),
            &ProfileUpdate::default(),
        );
        assert!(matches!(missing_role, Err(AppError::InvalidInput(_))));

        let missing_email = row_from_identity(&user(Some(Role::Tech), None), &ProfileUpdate::default());
        assert!(matches!(missing_email, Err(AppError::InvalidInput(_))));
    }
}
