//! Public-counter synchronizer.
//!
//! After any comment creation or deletion the owning submission's public
//! post must show the live top-level comment count. This runs as an
//! explicit post-commit hook: the triggering mutation has already
//! committed, so transport trouble here is logged and swallowed, never
//! surfaced back into the mutation.

use confide_common::AppResult;
use confide_db::repositories::{CommentRepository, SubmissionRepository};
use tracing::warn;

use crate::transport::{MessageRef, TransportHandle, channel_markup};

/// Counter synchronizer.
#[derive(Clone)]
pub struct CounterSyncService {
    submissions: SubmissionRepository,
    comments: CommentRepository,
    transport: TransportHandle,
    channel_id: i64,
}

impl CounterSyncService {
    /// Create a new counter synchronizer.
    #[must_use]
    pub const fn new(
        submissions: SubmissionRepository,
        comments: CommentRepository,
        transport: TransportHandle,
        channel_id: i64,
    ) -> Self {
        Self {
            submissions,
            comments,
            transport,
            channel_id,
        }
    }

    /// Re-read the top-level comment count and edit the public post's
    /// button to match. No-op for submissions that were never published.
    pub async fn sync_count(&self, submission_id: i64) -> AppResult<()> {
        let Some(submission) = self.submissions.find_by_id(submission_id).await? else {
            warn!(submission_id, "Counter sync for unknown submission");
            return Ok(());
        };
        let Some(message_id) = submission.channel_message_id else {
            return Ok(());
        };

        let count = self.comments.count_top_level(submission_id).await?;

        let edit = async {
            let username = self.transport.bot_username().await?;
            self.transport
                .edit_message_reply_markup(
                    MessageRef {
                        chat_id: self.channel_id,
                        message_id,
                    },
                    Some(channel_markup(&username, submission_id, count)),
                )
                .await
        };
        if let Err(e) = edit.await {
            warn!(error = %e, submission_id, "Failed to update public comment counter");
        }

        Ok(())
    }
}
