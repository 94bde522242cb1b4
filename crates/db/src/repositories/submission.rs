//! Submission repository.

use std::sync::Arc;

use crate::entities::{Submission, submission};
use confide_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Submission repository for database operations.
#[derive(Clone)]
pub struct SubmissionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubmissionRepository {
    /// Create a new submission repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a submission by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<submission::Model>> {
        Submission::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a submission by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: i64) -> AppResult<submission::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::SubmissionNotFound(id))
    }

    /// Create a new submission.
    pub async fn create(&self, model: submission::ActiveModel) -> AppResult<submission::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a submission.
    pub async fn update(&self, model: submission::ActiveModel) -> AppResult<submission::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get submissions authored by a user, most recent first.
    pub async fn find_by_author(&self, author_id: i64) -> AppResult<Vec<submission::Model>> {
        use sea_orm::QueryOrder;

        Submission::find()
            .filter(submission::Column::AuthorId.eq(author_id))
            .order_by_desc(submission::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
