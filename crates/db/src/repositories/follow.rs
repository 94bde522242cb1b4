//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use confide_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's follow on a submission.
    pub async fn find(&self, user_id: i64, submission_id: i64) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::SubmissionId.eq(submission_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a follow row.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a follow row (toggle-off).
    pub async fn delete(&self, user_id: i64, submission_id: i64) -> AppResult<()> {
        Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::SubmissionId.eq(submission_id))
            .exec(self.db.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all followers of a submission.
    pub async fn find_by_submission(&self, submission_id: i64) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::SubmissionId.eq(submission_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
