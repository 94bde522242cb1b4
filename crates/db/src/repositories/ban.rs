//! Ban repository.

use std::sync::Arc;

use crate::entities::{Ban, ban};
use confide_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Ban repository for database operations.
#[derive(Clone)]
pub struct BanRepository {
    db: Arc<DatabaseConnection>,
}

impl BanRepository {
    /// Create a new ban repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an active ban for a user.
    pub async fn find_by_user(&self, user_id: i64) -> AppResult<Option<ban::Model>> {
        Ban::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the user is banned.
    pub async fn is_banned(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.find_by_user(user_id).await?.is_some())
    }

    /// Record a ban.
    pub async fn create(&self, model: ban::ActiveModel) -> AppResult<ban::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Lift a ban. No-op if the user was not banned.
    pub async fn delete(&self, user_id: i64) -> AppResult<()> {
        Ban::delete_many()
            .filter(ban::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_ban(user_id: i64) -> ban::Model {
        ban::Model {
            user_id,
            moderator_id: 1,
            reason: "Repeated spam".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_banned_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_ban(100)]])
                .into_connection(),
        );

        let repo = BanRepository::new(db);
        assert!(repo.is_banned(100).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_banned_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ban::Model>::new()])
                .into_connection(),
        );

        let repo = BanRepository::new(db);
        assert!(!repo.is_banned(100).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = BanRepository::new(db);
        assert!(repo.delete(100).await.is_ok());
    }
}
