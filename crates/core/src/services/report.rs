//! Report manager: idempotent filing, moderator resolution.

use confide_common::{AppError, AppResult};
use confide_db::{
    entities::report::{self, ReportStatus},
    repositories::{CommentRepository, ReportRepository},
};
use sea_orm::Set;
use tracing::warn;

use crate::codec::CallbackAction;
use crate::transport::{InlineButton, InlineKeyboard, TransportHandle};

/// Result of filing a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Filed; moderators were notified.
    Accepted(report::Model),
    /// This reporter already filed on this comment (in any status).
    Duplicate,
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    reports: ReportRepository,
    comments: CommentRepository,
    transport: TransportHandle,
    admin_group_id: i64,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        reports: ReportRepository,
        comments: CommentRepository,
        transport: TransportHandle,
        admin_group_id: i64,
    ) -> Self {
        Self {
            reports,
            comments,
            transport,
            admin_group_id,
        }
    }

    /// File a report. Duplicate attempts are rejected, never merged.
    pub async fn file(
        &self,
        comment_id: i64,
        reporter_id: i64,
        reason: &str,
    ) -> AppResult<ReportOutcome> {
        let comment = self.comments.get_by_id(comment_id).await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("Report reason is required".to_string()));
        }

        if self.reports.exists_for(reporter_id, comment_id).await? {
            return Ok(ReportOutcome::Duplicate);
        }

        let model = report::ActiveModel {
            comment_id: Set(comment_id),
            reporter_id: Set(reporter_id),
            reason: Set(reason.to_string()),
            status: Set(ReportStatus::Pending),
            created_at: Set(chrono::Utc::now().into()),
            resolved_at: Set(None),
            ..Default::default()
        };
        let created = self.reports.create(model).await?;

        let notice = format!(
            "🚨 NEW REPORT on Comment #{comment_id} (Confession #{}).\n\n\
             Reason: {reason}\n\nReported comment:\n> {}\n\nAction:",
            comment.submission_id, comment.text
        );
        let markup = InlineKeyboard::default().row(vec![
            InlineButton::callback(
                "🗑️ Delete Comment",
                CallbackAction::ModDelete {
                    comment_id,
                    submission_id: comment.submission_id,
                }
                .encode(),
            ),
            InlineButton::callback(
                "✅ Dismiss Report",
                CallbackAction::ModDismiss { comment_id }.encode(),
            ),
        ]);
        if let Err(e) = self
            .transport
            .send_message(self.admin_group_id, &notice, Some(markup))
            .await
        {
            warn!(error = %e, comment_id, "Failed to notify moderators of report");
        }

        Ok(ReportOutcome::Accepted(created))
    }

    /// Mark all pending reports on a deleted comment resolved.
    ///
    /// Invoked by the comment manager's cascade; returns how many reports
    /// were resolved.
    pub async fn resolve_by_deletion(&self, comment_id: i64) -> AppResult<u64> {
        self.close_pending(comment_id, ReportStatus::Resolved).await
    }

    /// Dismiss pending reports without deleting the comment.
    pub async fn dismiss(&self, comment_id: i64) -> AppResult<u64> {
        self.close_pending(comment_id, ReportStatus::Dismissed).await
    }

    async fn close_pending(&self, comment_id: i64, status: ReportStatus) -> AppResult<u64> {
        let pending = self.reports.find_pending_by_comment(comment_id).await?;
        let count = pending.len() as u64;

        for report in pending {
            let mut model: report::ActiveModel = report.into();
            model.status = Set(status.clone());
            model.resolved_at = Set(Some(chrono::Utc::now().into()));
            self.reports.update(model).await?;
        }

        Ok(count)
    }
}
