//! Per-update dispatcher.
//!
//! One inbound update is handled to completion per user: a keyed async
//! mutex serializes events from the same user against their conversation
//! state, while different users proceed concurrently. Expected outcomes
//! become user-facing replies; faults are logged and the loop lives on.

use std::collections::HashMap;
use std::sync::Arc;

use confide_common::{AppError, AppResult};
use confide_core::codec::CallbackAction;
use confide_core::conversation::{
    Directive, Inbound, ModerationDirective, SessionStore, StateChange, resolve,
};
use confide_core::services::{
    CommentService, Decision, FollowService, ModerationService, ProfileService, ReportOutcome,
    ReportService, VoteService, extract_review_text,
};
use confide_core::transport::{MessageRef, TransportHandle};
use confide_db::entities::submission::SubmissionStatus;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::telegram::{WireCallbackQuery, WireMessage, WireUpdate};
use crate::ui;

/// The service bundle the dispatcher routes into.
pub struct Services {
    pub moderation: ModerationService,
    pub comments: CommentService,
    pub votes: VoteService,
    pub reports: ReportService,
    pub profiles: ProfileService,
    pub follows: FollowService,
}

struct CallbackRef {
    id: String,
    message: Option<MessageRef>,
    message_text: Option<String>,
}

struct EventContext {
    user_id: i64,
    user_name: String,
    chat_id: i64,
    callback: Option<CallbackRef>,
}

/// Event dispatcher.
pub struct Dispatcher {
    services: Services,
    sessions: Arc<dyn SessionStore>,
    transport: TransportHandle,
    admin_group_id: i64,
    report_reasons: Vec<String>,
    page_size: u64,
    user_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        services: Services,
        sessions: Arc<dyn SessionStore>,
        transport: TransportHandle,
        admin_group_id: i64,
        report_reasons: Vec<String>,
        page_size: u64,
    ) -> Self {
        Self {
            services,
            sessions,
            transport,
            admin_group_id,
            report_reasons,
            page_size,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one update. Never panics or propagates: the poll loop must
    /// survive every event.
    pub async fn handle_update(&self, update: WireUpdate) {
        if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        } else if let Some(message) = update.message {
            self.handle_message(message).await;
        }
    }

    async fn handle_message(&self, message: WireMessage) {
        let Some(user) = message.from else { return };
        let Some(text) = message.text else { return };
        // Conversations happen in private chats; group chatter is ignored.
        if message.chat.id != user.id {
            return;
        }

        let ctx = EventContext {
            user_id: user.id,
            user_name: user.first_name,
            chat_id: message.chat.id,
            callback: None,
        };
        self.process(ctx, parse_inbound(&text)).await;
    }

    async fn handle_callback(&self, callback: WireCallbackQuery) {
        let action = callback.data.as_deref().and_then(CallbackAction::decode);
        let Some(action) = action else {
            self.answer(&callback.id, Some("Invalid action.")).await;
            return;
        };

        let message_ref = callback.message.as_ref().map(|m| MessageRef {
            chat_id: m.chat.id,
            message_id: m.message_id,
        });
        let chat_id = message_ref.map_or(callback.from.id, |m| m.chat_id);

        // Moderator controls are honored only inside the admin group.
        if is_moderator_action(&action) && chat_id != self.admin_group_id {
            self.answer(&callback.id, Some("Not allowed.")).await;
            return;
        }

        let ctx = EventContext {
            user_id: callback.from.id,
            user_name: callback.from.first_name,
            chat_id,
            callback: Some(CallbackRef {
                id: callback.id,
                message: message_ref,
                message_text: callback.message.and_then(|m| m.text),
            }),
        };
        self.process(ctx, Inbound::Action(action)).await;
    }

    async fn process(&self, ctx: EventContext, inbound: Inbound) {
        let lock = self.user_lock(ctx.user_id).await;
        let _guard = lock.lock().await;

        if let Err(e) = self.process_locked(&ctx, inbound).await {
            self.report_error(&ctx, &e).await;
        }

        if let Some(callback) = &ctx.callback {
            // Acknowledge the press so the client stops spinning; some
            // branches already answered with a toast, in which case this
            // second answer is rejected by the platform and swallowed.
            self.answer(&callback.id, None).await;
        }
    }

    async fn process_locked(&self, ctx: &EventContext, inbound: Inbound) -> AppResult<()> {
        let state = self.sessions.get(ctx.user_id).await;
        let terms_accepted = self.services.profiles.has_accepted_terms(ctx.user_id).await?;

        let resolution = resolve(state.as_ref(), terms_accepted, inbound);
        match resolution.state {
            StateChange::Keep => {}
            StateChange::Clear => self.sessions.clear(ctx.user_id).await,
            StateChange::Set(next) => self.sessions.set(ctx.user_id, next).await,
        }

        self.execute(ctx, resolution.directive).await
    }

    async fn execute(&self, ctx: &EventContext, directive: Directive) -> AppResult<()> {
        match directive {
            Directive::ShowTerms => {
                self.send(ctx, ui::TERMS_TEXT, Some(ui::terms_keyboard())).await
            }
            Directive::TermsAccepted => {
                self.services.profiles.accept_terms(ctx.user_id).await?;
                self.send(ctx, "What are you sharing?", Some(ui::share_keyboard()))
                    .await
            }
            Directive::TermsDeclined => self.send(ctx, "❌ You declined.", None).await,
            Directive::AskShareType => {
                self.send(ctx, "What are you sharing?", Some(ui::share_keyboard()))
                    .await
            }
            Directive::PromptSubmission { .. } => {
                self.send(ctx, "✔ Okay — send your text now.", None).await
            }
            Directive::CreateSubmission { text } => {
                self.services
                    .moderation
                    .submit(ctx.user_id, &ctx.user_name, &text)
                    .await?;
                self.send(ctx, "✅ Confession sent for review!", None).await
            }
            Directive::PromptComment { .. } => {
                self.send(ctx, "📝 Please type your comment now:", None).await
            }
            Directive::PromptReply { .. } => {
                self.send(ctx, "📝 Please type your reply now:", None).await
            }
            Directive::CreateComment {
                submission_id,
                parent_id,
                text,
            } => {
                self.services
                    .comments
                    .create(submission_id, ctx.user_id, &text, parent_id)
                    .await?;
                self.send(
                    ctx,
                    &format!("✅ Your comment on Confession #{submission_id} is live!"),
                    None,
                )
                .await
            }
            Directive::AskReportReason {
                comment_id,
                submission_id,
            } => {
                self.send(
                    ctx,
                    "🚨 What is wrong with this comment? (Your report is anonymous)",
                    Some(ui::reason_keyboard(
                        comment_id,
                        submission_id,
                        &self.report_reasons,
                    )),
                )
                .await
            }
            Directive::FileReport {
                comment_id,
                reason_index,
                ..
            } => {
                let Some(reason) = self.report_reasons.get(reason_index) else {
                    return self.send(ctx, "Invalid report reason.", None).await;
                };
                match self
                    .services
                    .reports
                    .file(comment_id, ctx.user_id, reason)
                    .await?
                {
                    ReportOutcome::Accepted(_) => {
                        self.send(
                            ctx,
                            &format!("✅ Report submitted for reason: {reason}."),
                            None,
                        )
                        .await
                    }
                    ReportOutcome::Duplicate => {
                        self.send(ctx, "🚫 You have already reported this comment.", None)
                            .await
                    }
                }
            }
            Directive::PromptAlias => self.send(ctx, "✏️ Send your new alias now:", None).await,
            Directive::SetAlias { value } => {
                let profile = self.services.profiles.set_alias(ctx.user_id, &value).await?;
                self.send(ctx, &format!("✅ Alias updated to {}.", profile.alias), None)
                    .await
            }
            Directive::OpenHub { submission_id } => self.open_hub(ctx, submission_id).await,
            Directive::BrowsePage {
                submission_id,
                page,
            } => self.browse(ctx, submission_id, page).await,
            Directive::CastVote {
                comment_id,
                value,
                submission_id,
                page,
            } => {
                let tally = self
                    .services
                    .votes
                    .cast(ctx.user_id, comment_id, value)
                    .await?;
                if let Some(message) = ctx.callback.as_ref().and_then(|c| c.message) {
                    let markup = ui::comment_keyboard(comment_id, submission_id, page, tally);
                    if let Err(e) = self
                        .transport
                        .edit_message_reply_markup(message, Some(markup))
                        .await
                    {
                        warn!(error = %e, comment_id, "Failed to refresh vote keyboard");
                    }
                }
                if let Some(callback) = &ctx.callback {
                    self.answer(&callback.id, Some("Vote recorded!")).await;
                }
                Ok(())
            }
            Directive::ToggleFollow { submission_id } => {
                let following = self
                    .services
                    .follows
                    .toggle(ctx.user_id, submission_id)
                    .await?;
                let text = if following {
                    format!("🔔 Following Confession #{submission_id}.")
                } else {
                    format!("🔕 Unfollowed Confession #{submission_id}.")
                };
                self.send(ctx, &text, None).await
            }
            Directive::Moderate(directive) => self.moderate(ctx, directive).await,
            Directive::ShowMenu => self.send(ctx, ui::MENU_TEXT, Some(ui::menu_keyboard())).await,
            Directive::Cancelled => self.send(ctx, "Cancelled.", None).await,
            Directive::UnknownCommand => {
                self.send(ctx, "Unrecognized command. Use /start or /cancel.", None)
                    .await
            }
            Directive::InvalidInput => self.send(ctx, "Invalid link.", None).await,
            Directive::Noop => Ok(()),
        }
    }

    async fn open_hub(&self, ctx: &EventContext, submission_id: i64) -> AppResult<()> {
        let submission = self.services.moderation.get(submission_id).await?;
        // Pending and rejected submissions are invisible to readers.
        if submission.status != SubmissionStatus::Published {
            return Err(AppError::SubmissionNotFound(submission_id));
        }

        let count = self.services.comments.top_level_count(submission_id).await?;
        self.send(
            ctx,
            &ui::hub_text(&submission),
            Some(ui::hub_keyboard(submission_id, count)),
        )
        .await
    }

    async fn browse(&self, ctx: &EventContext, submission_id: i64, page: u64) -> AppResult<()> {
        let page_data = self
            .services
            .comments
            .list_page(submission_id, page, self.page_size)
            .await?;

        // Replace the previous listing rather than stacking them.
        if let Some(message) = ctx.callback.as_ref().and_then(|c| c.message) {
            if let Err(e) = self.transport.delete_message(message).await {
                warn!(error = %e, "Failed to delete stale listing");
            }
        }

        if page_data.items.is_empty() {
            return self.send(ctx, "No comments yet.", None).await;
        }

        for item in &page_data.items {
            self.send(
                ctx,
                &ui::comment_text(item),
                Some(ui::comment_keyboard(
                    item.comment.id,
                    submission_id,
                    page_data.page,
                    item.tally,
                )),
            )
            .await?;
        }
        self.send(
            ctx,
            &ui::pager_text(&page_data),
            Some(ui::pager_keyboard(submission_id, &page_data)),
        )
        .await
    }

    async fn moderate(&self, ctx: &EventContext, directive: ModerationDirective) -> AppResult<()> {
        match directive {
            ModerationDirective::Approve { submission_id } => {
                self.decide(ctx, submission_id, Decision::Approve).await
            }
            ModerationDirective::Reject { submission_id } => {
                self.decide(ctx, submission_id, Decision::Reject).await
            }
            ModerationDirective::DeleteComment { comment_id, .. } => {
                self.services.comments.delete(comment_id).await?;
                self.conclude_review(
                    ctx,
                    &format!("🗑️ Comment #{comment_id} deleted. Channel count updated."),
                )
                .await
            }
            ModerationDirective::DismissReports { comment_id } => {
                let count = self.services.reports.dismiss(comment_id).await?;
                self.conclude_review(
                    ctx,
                    &format!("✅ {count} report(s) for Comment #{comment_id} dismissed."),
                )
                .await
            }
        }
    }

    async fn decide(
        &self,
        ctx: &EventContext,
        submission_id: i64,
        decision: Decision,
    ) -> AppResult<()> {
        // The review message is the moderator's editing surface: its
        // current wording wins over the stored text.
        let edited = ctx
            .callback
            .as_ref()
            .and_then(|c| c.message_text.as_deref())
            .and_then(extract_review_text);

        self.services
            .moderation
            .decide(submission_id, decision, edited)
            .await?;

        let summary = match decision {
            Decision::Approve => format!("✅ Confession #{submission_id} Published."),
            Decision::Reject => format!("❌ Confession #{submission_id} Rejected."),
        };
        self.conclude_review(ctx, &summary).await
    }

    /// Replace the review/report message with its outcome, dropping the
    /// action buttons so the decision cannot be replayed from the UI.
    async fn conclude_review(&self, ctx: &EventContext, summary: &str) -> AppResult<()> {
        if let Some(message) = ctx.callback.as_ref().and_then(|c| c.message) {
            if self
                .transport
                .edit_message_text(message, summary, None)
                .await
                .is_ok()
            {
                return Ok(());
            }
        }
        self.send(ctx, summary, None).await
    }

    async fn send(
        &self,
        ctx: &EventContext,
        text: &str,
        markup: Option<confide_core::transport::InlineKeyboard>,
    ) -> AppResult<()> {
        self.transport
            .send_message(ctx.chat_id, text, markup)
            .await
            .map(|_| ())
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(callback_id, text).await {
            warn!(error = %e, "Failed to answer callback");
        }
    }

    async fn report_error(&self, ctx: &EventContext, error: &AppError) {
        if error.is_fault() {
            error!(
                error = %error,
                code = error.error_code(),
                user_id = ctx.user_id,
                "Event handling failed"
            );
            self.send_best_effort(ctx, "⚠️ Something went wrong. Please try again later.")
                .await;
            return;
        }

        // A missing row invalidates whatever flow pointed at it.
        if matches!(
            error,
            AppError::NotFound(_) | AppError::SubmissionNotFound(_) | AppError::CommentNotFound(_)
        ) {
            self.sessions.clear(ctx.user_id).await;
        }

        let text = match error {
            AppError::SubmissionNotFound(_) => "Confession not found.".to_string(),
            AppError::CommentNotFound(_) => "Comment not found.".to_string(),
            AppError::NotFound(_) => "Not found.".to_string(),
            AppError::Banned => "🚫 You are banned from using this bot.".to_string(),
            AppError::AlreadyDecided(id) => format!("Confession #{id} was already decided."),
            AppError::Duplicate(_) => "Already done.".to_string(),
            AppError::BadRequest(message) => message.clone(),
            _ => "Request failed.".to_string(),
        };
        self.send_best_effort(ctx, &text).await;
    }

    async fn send_best_effort(&self, ctx: &EventContext, text: &str) {
        if let Err(e) = self.transport.send_message(ctx.chat_id, text, None).await {
            warn!(error = %e, chat_id = ctx.chat_id, "Failed to send reply");
        }
    }

    async fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        Arc::clone(locks.entry(user_id).or_default())
    }
}

const fn is_moderator_action(action: &CallbackAction) -> bool {
    matches!(
        action,
        CallbackAction::ModApprove { .. }
            | CallbackAction::ModReject { .. }
            | CallbackAction::ModDelete { .. }
            | CallbackAction::ModDismiss { .. }
    )
}

fn parse_inbound(text: &str) -> Inbound {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Inbound::Text(trimmed.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    // Commands in groups arrive as /start@botname.
    let name = name.split('@').next().unwrap_or(name).to_lowercase();
    let payload = parts
        .next()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    Inbound::Command { name, payload }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::telegram::{WireChat, WireUser};
    use confide_core::conversation::InMemorySessionStore;
    use confide_core::services::CounterSyncService;
    use confide_core::transport::{Outbound, RecordingTransport};
    use confide_db::repositories::{
        BanRepository, CommentRepository, FollowRepository, ProfileRepository, ReportRepository,
        SubmissionRepository, VoteRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};

    const ADMIN_GROUP: i64 = -1000;
    const CHANNEL: i64 = -2000;

    fn test_dispatcher(transport: Arc<RecordingTransport>) -> Dispatcher {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let handle: TransportHandle = Arc::clone(&transport) as TransportHandle;

        let profiles = ProfileService::new(ProfileRepository::new(Arc::clone(&db)));
        let reports = ReportService::new(
            ReportRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            Arc::clone(&handle),
            ADMIN_GROUP,
        );
        let sync = CounterSyncService::new(
            SubmissionRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            Arc::clone(&handle),
            CHANNEL,
        );
        let services = Services {
            moderation: ModerationService::new(
                SubmissionRepository::new(Arc::clone(&db)),
                BanRepository::new(Arc::clone(&db)),
                Arc::clone(&handle),
                ADMIN_GROUP,
                CHANNEL,
            ),
            comments: CommentService::new(
                CommentRepository::new(Arc::clone(&db)),
                SubmissionRepository::new(Arc::clone(&db)),
                VoteRepository::new(Arc::clone(&db)),
                BanRepository::new(Arc::clone(&db)),
                FollowRepository::new(Arc::clone(&db)),
                profiles.clone(),
                reports.clone(),
                sync,
                Arc::clone(&handle),
            ),
            votes: VoteService::new(
                VoteRepository::new(Arc::clone(&db)),
                CommentRepository::new(Arc::clone(&db)),
                BanRepository::new(Arc::clone(&db)),
            ),
            reports,
            profiles,
            follows: FollowService::new(
                FollowRepository::new(Arc::clone(&db)),
                SubmissionRepository::new(Arc::clone(&db)),
            ),
        };

        Dispatcher::new(
            services,
            Arc::new(InMemorySessionStore::new()),
            handle,
            ADMIN_GROUP,
            vec!["Violence".to_string(), "Spam/Scam".to_string()],
            3,
        )
    }

    #[test]
    fn test_parse_inbound_commands() {
        assert_eq!(
            parse_inbound("/start"),
            Inbound::Command {
                name: "start".to_string(),
                payload: None
            }
        );
        assert_eq!(
            parse_inbound("/start conf_55"),
            Inbound::Command {
                name: "start".to_string(),
                payload: Some("conf_55".to_string())
            }
        );
        assert_eq!(
            parse_inbound("/START@confide_bot"),
            Inbound::Command {
                name: "start".to_string(),
                payload: None
            }
        );
        assert_eq!(
            parse_inbound("just text"),
            Inbound::Text("just text".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_callback_fails_closed() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = test_dispatcher(Arc::clone(&transport));

        dispatcher
            .handle_callback(WireCallbackQuery {
                id: "cb1".to_string(),
                from: WireUser {
                    id: 100,
                    first_name: "Alice".to_string(),
                },
                message: None,
                data: Some("vote:7:sideways:55:1".to_string()),
            })
            .await;

        // Answered "invalid", and no service or send was reached.
        assert_eq!(
            transport.calls(),
            vec![Outbound::Answered {
                callback_id: "cb1".to_string(),
                text: Some("Invalid action.".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_moderator_action_outside_admin_group_is_refused() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = test_dispatcher(Arc::clone(&transport));

        dispatcher
            .handle_callback(WireCallbackQuery {
                id: "cb2".to_string(),
                from: WireUser {
                    id: 100,
                    first_name: "Alice".to_string(),
                },
                message: Some(WireMessage {
                    message_id: 7,
                    chat: WireChat { id: 100 },
                    from: None,
                    text: None,
                }),
                data: Some("mod:del:7:55".to_string()),
            })
            .await;

        assert_eq!(
            transport.calls(),
            vec![Outbound::Answered {
                callback_id: "cb2".to_string(),
                text: Some("Not allowed.".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_group_chatter_is_ignored() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = test_dispatcher(Arc::clone(&transport));

        dispatcher
            .handle_message(WireMessage {
                message_id: 1,
                chat: WireChat { id: ADMIN_GROUP },
                from: Some(WireUser {
                    id: 100,
                    first_name: "Alice".to_string(),
                }),
                text: Some("hello".to_string()),
            })
            .await;

        assert!(transport.calls().is_empty());
    }
}
