//! Moderation pipeline: intake, review, exactly-once decision, bans.

use confide_common::{AppError, AppResult};
use confide_db::{
    entities::{
        ban,
        submission::{self, SubmissionStatus},
    },
    repositories::{BanRepository, SubmissionRepository},
};
use sea_orm::Set;
use tracing::warn;

use crate::codec::CallbackAction;
use crate::transport::{InlineButton, InlineKeyboard, TransportHandle, channel_markup};

const MAX_SUBMISSION_LEN: usize = 4000;

/// A moderator's verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    submissions: SubmissionRepository,
    bans: BanRepository,
    transport: TransportHandle,
    admin_group_id: i64,
    channel_id: i64,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub fn new(
        submissions: SubmissionRepository,
        bans: BanRepository,
        transport: TransportHandle,
        admin_group_id: i64,
        channel_id: i64,
    ) -> Self {
        Self {
            submissions,
            bans,
            transport,
            admin_group_id,
            channel_id,
        }
    }

    /// Intake a confession: create it pending and ask moderators to review.
    ///
    /// The review request send is best-effort; the row is already committed
    /// and moderators can be re-notified.
    pub async fn submit(
        &self,
        author_id: i64,
        author_name: &str,
        text: &str,
    ) -> AppResult<submission::Model> {
        if self.bans.is_banned(author_id).await? {
            return Err(AppError::Banned);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest(
                "Confession text is required".to_string(),
            ));
        }
        if text.len() > MAX_SUBMISSION_LEN {
            return Err(AppError::BadRequest("Confession text too long".to_string()));
        }

        let model = submission::ActiveModel {
            author_id: Set(author_id),
            author_name: Set(author_name.to_string()),
            text: Set(text.to_string()),
            status: Set(SubmissionStatus::Pending),
            channel_message_id: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            decided_at: Set(None),
            ..Default::default()
        };
        let created = self.submissions.create(model).await?;

        let markup = InlineKeyboard::default().row(vec![
            InlineButton::callback(
                "✅ Approve",
                CallbackAction::ModApprove {
                    submission_id: created.id,
                }
                .encode(),
            ),
            InlineButton::callback(
                "❌ Reject",
                CallbackAction::ModReject {
                    submission_id: created.id,
                }
                .encode(),
            ),
        ]);
        if let Err(e) = self
            .transport
            .send_message(
                self.admin_group_id,
                &render_review_request(&created),
                Some(markup),
            )
            .await
        {
            warn!(error = %e, submission_id = created.id, "Failed to send review request");
        }

        Ok(created)
    }

    /// Fetch a submission by id.
    pub async fn get(&self, submission_id: i64) -> AppResult<submission::Model> {
        self.submissions.get_by_id(submission_id).await
    }

    /// Overwrite a pending submission's text before the decision.
    pub async fn edit_text(&self, submission_id: i64, text: &str) -> AppResult<submission::Model> {
        let submission = self.submissions.get_by_id(submission_id).await?;
        if submission.status != SubmissionStatus::Pending {
            return Err(AppError::AlreadyDecided(submission_id));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest(
                "Confession text is required".to_string(),
            ));
        }

        let mut model: submission::ActiveModel = submission.into();
        model.text = Set(text.to_string());
        self.submissions.update(model).await
    }

    /// Decide a pending submission, exactly once.
    ///
    /// `edited_text`, when present, is the moderator's final wording and
    /// replaces the stored text. Approval publishes to the channel first
    /// and persists only after the send is confirmed: a transport failure
    /// leaves the row pending so the moderator can retry.
    pub async fn decide(
        &self,
        submission_id: i64,
        decision: Decision,
        edited_text: Option<String>,
    ) -> AppResult<submission::Model> {
        let submission = self.submissions.get_by_id(submission_id).await?;
        if submission.status != SubmissionStatus::Pending {
            return Err(AppError::AlreadyDecided(submission_id));
        }

        let final_text = edited_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&submission.text)
            .to_string();
        let author_id = submission.author_id;

        let decided = match decision {
            Decision::Reject => {
                let mut model: submission::ActiveModel = submission.into();
                model.status = Set(SubmissionStatus::Rejected);
                model.text = Set(final_text);
                model.decided_at = Set(Some(chrono::Utc::now().into()));
                self.submissions.update(model).await?
            }
            Decision::Approve => {
                let username = self.transport.bot_username().await?;
                let post_text =
                    format!("Confession #{submission_id}\n\n{final_text}\n\n#Confession");
                let markup = channel_markup(&username, submission_id, 0);

                // Publish first; persist only after the send is confirmed.
                let sent = self
                    .transport
                    .send_message(self.channel_id, &post_text, Some(markup))
                    .await?;

                let mut model: submission::ActiveModel = submission.into();
                model.status = Set(SubmissionStatus::Published);
                model.text = Set(final_text);
                model.channel_message_id = Set(Some(sent.message_id));
                model.decided_at = Set(Some(chrono::Utc::now().into()));
                self.submissions.update(model).await?
            }
        };

        let notice = match decision {
            Decision::Approve => format!("✅ Your confession #{submission_id} was published!"),
            Decision::Reject => "❌ Your confession was rejected by the moderators.".to_string(),
        };
        if let Err(e) = self.transport.send_message(author_id, &notice, None).await {
            warn!(error = %e, submission_id, "Failed to notify author of decision");
        }

        Ok(decided)
    }

    /// Bar a user from submitting and engaging.
    pub async fn ban(&self, user_id: i64, moderator_id: i64, reason: &str) -> AppResult<ban::Model> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("Ban reason is required".to_string()));
        }
        if self.bans.is_banned(user_id).await? {
            return Err(AppError::Duplicate(format!("user {user_id} already banned")));
        }

        let model = ban::ActiveModel {
            user_id: Set(user_id),
            moderator_id: Set(moderator_id),
            reason: Set(reason.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.bans.create(model).await
    }

    /// Lift a ban.
    pub async fn lift_ban(&self, user_id: i64) -> AppResult<()> {
        self.bans.delete(user_id).await
    }

    /// Whether a user is banned.
    pub async fn is_banned(&self, user_id: i64) -> AppResult<bool> {
        self.bans.is_banned(user_id).await
    }
}

const REVIEW_CONTENT_MARKER: &str = "📝 Content:";
const REVIEW_FOOTER_MARKER: &str = "Admins:";

fn render_review_request(submission: &submission::Model) -> String {
    format!(
        "🛂 Review New Confession\n👤 Author: {} (ID: {})\n{REVIEW_CONTENT_MARKER}\n{}\n\n\
         {REVIEW_FOOTER_MARKER} Edit this message to sanitize, then Approve.",
        submission.author_name, submission.author_id, submission.text
    )
}

/// Pull the (possibly moderator-edited) confession text back out of a
/// review-request message. Returns `None` when the markers are missing,
/// in which case the stored text is used as-is.
#[must_use]
pub fn extract_review_text(message: &str) -> Option<String> {
    let after = message.split(REVIEW_CONTENT_MARKER).nth(1)?;
    let body = after.split(REVIEW_FOOTER_MARKER).next()?;
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}
