//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, report};
use confide_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether this reporter already filed on this comment, in any status.
    pub async fn exists_for(&self, reporter_id: i64, comment_id: i64) -> AppResult<bool> {
        Report::find()
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map(|row| row.is_some())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get pending reports against a comment, oldest first.
    pub async fn find_pending_by_comment(&self, comment_id: i64) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::CommentId.eq(comment_id))
            .filter(report::Column::Status.eq(report::ReportStatus::Pending))
            .order_by_asc(report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
