//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use confide_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a comment by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: i64) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::CommentNotFound(id))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all top-level comments of a submission in insertion order.
    ///
    /// Ranking by net score happens in the service layer after tallies are
    /// derived; this query only narrows to `parent_id IS NULL`.
    pub async fn find_top_level(&self, submission_id: i64) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::SubmissionId.eq(submission_id))
            .filter(comment::Column::ParentId.is_null())
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count top-level comments of a submission.
    pub async fn count_top_level(&self, submission_id: i64) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::SubmissionId.eq(submission_id))
            .filter(comment::Column::ParentId.is_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get direct replies to any of the given parent comments, in insertion
    /// order.
    pub async fn find_replies(&self, parent_ids: &[i64]) -> AppResult<Vec<comment::Model>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        Comment::find()
            .filter(comment::Column::ParentId.is_in(parent_ids.iter().copied()))
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete comments by ID. Returns the number of rows removed.
    pub async fn delete_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        Comment::delete_many()
            .filter(comment::Column::Id.is_in(ids.iter().copied()))
            .exec(self.db.as_ref())
            .await
            .map(|res| res.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
