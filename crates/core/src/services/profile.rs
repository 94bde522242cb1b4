//! Profile service: anonymous alias and terms consent.

use confide_common::{AppError, AppResult};
use confide_db::{entities::profile, repositories::ProfileRepository};
use sea_orm::Set;

/// Alias shown on comments when the user never set one.
pub const DEFAULT_ALIAS: &str = "Anonymous";

const MAX_ALIAS_LEN: usize = 64;

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    profiles: ProfileRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profiles: ProfileRepository) -> Self {
        Self { profiles }
    }

    /// Get the user's profile, creating a default one on first contact.
    pub async fn get_or_default(&self, user_id: i64) -> AppResult<profile::Model> {
        if let Some(profile) = self.profiles.find_by_user(user_id).await? {
            return Ok(profile);
        }

        let model = profile::ActiveModel {
            user_id: Set(user_id),
            alias: Set(DEFAULT_ALIAS.to_string()),
            terms_accepted_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.profiles.create(model).await
    }

    /// The display label to stamp on a new comment.
    pub async fn display_label(&self, user_id: i64) -> AppResult<String> {
        Ok(self
            .profiles
            .find_by_user(user_id)
            .await?
            .map_or_else(|| DEFAULT_ALIAS.to_string(), |p| p.alias))
    }

    /// Set the anonymous alias.
    pub async fn set_alias(&self, user_id: i64, alias: &str) -> AppResult<profile::Model> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(AppError::BadRequest("Alias is required".to_string()));
        }
        if alias.len() > MAX_ALIAS_LEN {
            return Err(AppError::BadRequest("Alias too long".to_string()));
        }

        let profile = self.get_or_default(user_id).await?;
        let mut model: profile::ActiveModel = profile.into();
        model.alias = Set(alias.to_string());
        self.profiles.update(model).await
    }

    /// Record terms consent. Idempotent: an earlier timestamp is kept.
    pub async fn accept_terms(&self, user_id: i64) -> AppResult<profile::Model> {
        let profile = self.get_or_default(user_id).await?;
        if profile.terms_accepted_at.is_some() {
            return Ok(profile);
        }

        let mut model: profile::ActiveModel = profile.into();
        model.terms_accepted_at = Set(Some(chrono::Utc::now().into()));
        self.profiles.update(model).await
    }

    /// Whether the user has accepted the terms.
    pub async fn has_accepted_terms(&self, user_id: i64) -> AppResult<bool> {
        Ok(self
            .profiles
            .find_by_user(user_id)
            .await?
            .is_some_and(|p| p.terms_accepted_at.is_some()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_profile(user_id: i64, alias: &str, accepted: bool) -> profile::Model {
        profile::Model {
            user_id,
            alias: alias.to_string(),
            terms_accepted_at: accepted.then(|| Utc::now().into()),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ProfileService {
        ProfileService::new(ProfileRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_set_alias_rejects_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).set_alias(100, "   ").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_set_alias_rejects_overlong() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).set_alias(100, &"x".repeat(65)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_set_alias_trims_and_updates() {
        let existing = create_test_profile(100, "Anonymous", false);
        let updated = create_test_profile(100, "NightOwl", false);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .append_query_results([[updated]])
            .append_exec_results([sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let result = service(db).set_alias(100, "  NightOwl  ").await.unwrap();

        assert_eq!(result.alias, "NightOwl");
    }

    #[tokio::test]
    async fn test_has_accepted_terms_defaults_false() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .into_connection();

        assert!(!service(db).has_accepted_terms(100).await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_terms_is_idempotent() {
        let accepted = create_test_profile(100, "Anonymous", true);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[accepted.clone()]])
            .into_connection();

        // Already accepted: no update is issued.
        let result = service(db).accept_terms(100).await.unwrap();

        assert_eq!(result.terms_accepted_at, accepted.terms_accepted_at);
    }

    #[tokio::test]
    async fn test_display_label_falls_back_to_default() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .into_connection();

        let label = service(db).display_label(100).await.unwrap();

        assert_eq!(label, DEFAULT_ALIAS);
    }
}
