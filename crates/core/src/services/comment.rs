//! Comment and thread manager.
//!
//! Creates comments and one-level-deep replies under published
//! submissions, serves the vote-ranked paginated view, and cascades
//! deletion through votes, replies, and reports. Every mutation ends by
//! triggering the public-counter synchronizer as a post-commit hook.

use confide_common::{AppError, AppResult};
use confide_db::{
    entities::{
        comment,
        submission::SubmissionStatus,
        vote::{self, VoteValue},
    },
    repositories::{
        BanRepository, CommentRepository, FollowRepository, SubmissionRepository, VoteRepository,
        VoteTally,
    },
};
use sea_orm::Set;
use std::collections::HashMap;
use tracing::warn;

use crate::services::profile::ProfileService;
use crate::services::report::ReportService;
use crate::services::sync::CounterSyncService;
use crate::transport::TransportHandle;

const MAX_COMMENT_LEN: usize = 2000;

/// A reply with its derived tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedReply {
    pub comment: comment::Model,
    pub tally: VoteTally,
}

/// A top-level comment with its tally and attached replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedComment {
    pub comment: comment::Model,
    pub tally: VoteTally,
    pub replies: Vec<RankedReply>,
}

/// One page of the engagement view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    /// Top-level comments only; replies ride along without consuming
    /// page slots.
    pub items: Vec<RankedComment>,
    /// Total top-level comments on the submission.
    pub total: u64,
    /// The clamped page number actually served.
    pub page: u64,
    pub total_pages: u64,
}

impl CommentPage {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepository,
    submissions: SubmissionRepository,
    votes: VoteRepository,
    bans: BanRepository,
    follows: FollowRepository,
    profiles: ProfileService,
    reports: ReportService,
    sync: CounterSyncService,
    transport: TransportHandle,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        comments: CommentRepository,
        submissions: SubmissionRepository,
        votes: VoteRepository,
        bans: BanRepository,
        follows: FollowRepository,
        profiles: ProfileService,
        reports: ReportService,
        sync: CounterSyncService,
        transport: TransportHandle,
    ) -> Self {
        Self {
            comments,
            submissions,
            votes,
            bans,
            follows,
            profiles,
            reports,
            sync,
            transport,
        }
    }

    /// Add a comment (or, with `parent_id`, a reply) to a published
    /// submission.
    pub async fn create(
        &self,
        submission_id: i64,
        author_id: i64,
        text: &str,
        parent_id: Option<i64>,
    ) -> AppResult<comment::Model> {
        if self.bans.is_banned(author_id).await? {
            return Err(AppError::Banned);
        }

        let submission = self.submissions.get_by_id(submission_id).await?;
        if submission.status != SubmissionStatus::Published {
            return Err(AppError::BadRequest(
                "Comments are only open on published confessions".to_string(),
            ));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Comment text is required".to_string()));
        }
        if text.len() > MAX_COMMENT_LEN {
            return Err(AppError::BadRequest("Comment text too long".to_string()));
        }

        if let Some(parent_id) = parent_id {
            let parent = self.comments.get_by_id(parent_id).await?;
            if parent.submission_id != submission_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to a different confession".to_string(),
                ));
            }
            // Threads are exactly one level deep.
            if parent.parent_id.is_some() {
                return Err(AppError::BadRequest(
                    "Replies to replies are not supported".to_string(),
                ));
            }
        }

        let author_label = self.profiles.display_label(author_id).await?;

        let model = comment::ActiveModel {
            submission_id: Set(submission_id),
            parent_id: Set(parent_id),
            author_id: Set(author_id),
            author_label: Set(author_label),
            text: Set(text.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        let created = self.comments.create(model).await?;

        // Post-commit hooks, both best-effort.
        if let Err(e) = self.sync.sync_count(submission_id).await {
            warn!(error = %e, submission_id, "Counter sync after comment creation failed");
        }
        if parent_id.is_none() {
            self.notify_followers(submission_id, author_id).await;
        }

        Ok(created)
    }

    /// Serve one page of top-level comments, ranked by net score
    /// descending with ties broken by insertion order. Out-of-range page
    /// numbers clamp instead of erroring.
    pub async fn list_page(
        &self,
        submission_id: i64,
        page: u64,
        page_size: u64,
    ) -> AppResult<CommentPage> {
        self.submissions.get_by_id(submission_id).await?;

        let top_level = self.comments.find_top_level(submission_id).await?;
        let total = top_level.len() as u64;
        let (page, total_pages) = clamp_page(page, total, page_size);

        let top_ids: Vec<i64> = top_level.iter().map(|c| c.id).collect();
        let tallies = tally_map(&self.votes.find_by_comments(&top_ids).await?);

        let mut ranked: Vec<(comment::Model, VoteTally)> = top_level
            .into_iter()
            .map(|c| {
                let tally = tallies.get(&c.id).copied().unwrap_or_default();
                (c, tally)
            })
            .collect();
        ranked.sort_by(|(a, ta), (b, tb)| tb.net().cmp(&ta.net()).then(a.id.cmp(&b.id)));

        let start = ((page - 1) * page_size) as usize;
        let window: Vec<(comment::Model, VoteTally)> = ranked
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        let window_ids: Vec<i64> = window.iter().map(|(c, _)| c.id).collect();
        let replies = self.comments.find_replies(&window_ids).await?;
        let reply_ids: Vec<i64> = replies.iter().map(|c| c.id).collect();
        let reply_tallies = tally_map(&self.votes.find_by_comments(&reply_ids).await?);

        let mut replies_by_parent: HashMap<i64, Vec<RankedReply>> = HashMap::new();
        for reply in replies {
            let tally = reply_tallies.get(&reply.id).copied().unwrap_or_default();
            if let Some(parent_id) = reply.parent_id {
                replies_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(RankedReply {
                        comment: reply,
                        tally,
                    });
            }
        }

        let items = window
            .into_iter()
            .map(|(c, tally)| {
                let replies = replies_by_parent.remove(&c.id).unwrap_or_default();
                RankedComment {
                    comment: c,
                    tally,
                    replies,
                }
            })
            .collect();

        Ok(CommentPage {
            items,
            total,
            page,
            total_pages,
        })
    }

    /// Live top-level comment count for a submission.
    pub async fn top_level_count(&self, submission_id: i64) -> AppResult<u64> {
        self.comments.count_top_level(submission_id).await
    }

    /// Delete a comment: cascade to its votes and direct replies, resolve
    /// its reports, then resynchronize the public counter. Returns the
    /// owning submission id.
    pub async fn delete(&self, comment_id: i64) -> AppResult<i64> {
        let comment = self.comments.get_by_id(comment_id).await?;
        let submission_id = comment.submission_id;

        let replies = self.comments.find_replies(&[comment_id]).await?;
        let mut ids: Vec<i64> = vec![comment_id];
        ids.extend(replies.iter().map(|r| r.id));

        self.votes.delete_by_comments(&ids).await?;
        for id in &ids {
            self.reports.resolve_by_deletion(*id).await?;
        }
        self.comments.delete_by_ids(&ids).await?;

        if let Err(e) = self.sync.sync_count(submission_id).await {
            warn!(error = %e, submission_id, "Counter sync after comment deletion failed");
        }

        Ok(submission_id)
    }

    async fn notify_followers(&self, submission_id: i64, author_id: i64) {
        let followers = match self.follows.find_by_submission(submission_id).await {
            Ok(followers) => followers,
            Err(e) => {
                warn!(error = %e, submission_id, "Failed to load followers");
                return;
            }
        };

        let notice = format!("💬 New comment on Confession #{submission_id}.");
        for follow in followers {
            if follow.user_id == author_id {
                continue;
            }
            if let Err(e) = self
                .transport
                .send_message(follow.user_id, &notice, None)
                .await
            {
                warn!(error = %e, user_id = follow.user_id, "Failed to notify follower");
            }
        }
    }
}

/// Clamp a requested page into `[1, total_pages]`.
fn clamp_page(page: u64, total: u64, page_size: u64) -> (u64, u64) {
    let page_size = page_size.max(1);
    let total_pages = if total == 0 { 1 } else { total.div_ceil(page_size) };
    (page.clamp(1, total_pages), total_pages)
}

fn tally_map(votes: &[vote::Model]) -> HashMap<i64, VoteTally> {
    let mut map: HashMap<i64, VoteTally> = HashMap::new();
    for vote in votes {
        let tally = map.entry(vote.comment_id).or_default();
        match vote.value {
            VoteValue::Up => tally.likes += 1,
            VoteValue::Down => tally.dislikes += 1,
        }
    }
    map
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::{Outbound, RecordingTransport};
    use confide_db::entities::{ban, follow, profile, report, submission};
    use confide_db::repositories::{ProfileRepository, ReportRepository};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const ADMIN_GROUP: i64 = -1000;
    const CHANNEL: i64 = -2000;

    fn create_test_submission(
        id: i64,
        status: SubmissionStatus,
        channel_message_id: Option<i64>,
    ) -> submission::Model {
        submission::Model {
            id,
            author_id: 100,
            author_name: "Alice".to_string(),
            text: "Hello".to_string(),
            status,
            channel_message_id,
            created_at: Utc::now().into(),
            decided_at: None,
        }
    }

    fn create_test_comment(id: i64, submission_id: i64, parent_id: Option<i64>) -> comment::Model {
        comment::Model {
            id,
            submission_id,
            parent_id,
            author_id: 200,
            author_label: "Anonymous".to_string(),
            text: format!("comment {id}"),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_vote(voter_id: i64, comment_id: i64, value: VoteValue) -> vote::Model {
        vote::Model {
            voter_id,
            comment_id,
            value,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn service(
        db: sea_orm::DatabaseConnection,
        transport: Arc<RecordingTransport>,
    ) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            CommentRepository::new(Arc::clone(&db)),
            SubmissionRepository::new(Arc::clone(&db)),
            VoteRepository::new(Arc::clone(&db)),
            BanRepository::new(Arc::clone(&db)),
            FollowRepository::new(Arc::clone(&db)),
            ProfileService::new(ProfileRepository::new(Arc::clone(&db))),
            ReportService::new(
                ReportRepository::new(Arc::clone(&db)),
                CommentRepository::new(Arc::clone(&db)),
                Arc::clone(&transport) as TransportHandle,
                ADMIN_GROUP,
            ),
            CounterSyncService::new(
                SubmissionRepository::new(Arc::clone(&db)),
                CommentRepository::new(Arc::clone(&db)),
                Arc::clone(&transport) as TransportHandle,
                CHANNEL,
            ),
            transport,
        )
    }

    #[test]
    fn test_clamp_page() {
        // 7 comments, 3 per page: pages 1..=3.
        assert_eq!(clamp_page(1, 7, 3), (1, 3));
        assert_eq!(clamp_page(3, 7, 3), (3, 3));
        assert_eq!(clamp_page(0, 7, 3), (1, 3));
        assert_eq!(clamp_page(99, 7, 3), (3, 3));
        // Empty set still has one (empty) page.
        assert_eq!(clamp_page(5, 0, 3), (1, 1));
    }

    #[tokio::test]
    async fn test_list_page_windows_seven_comments() {
        let comments: Vec<comment::Model> =
            (1..=7).map(|id| create_test_comment(id, 55, None)).collect();
        let submission = create_test_submission(55, SubmissionStatus::Published, Some(900));
        let transport = Arc::new(RecordingTransport::new());

        // Page 1: 3 items, next present.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[submission.clone()]])
            .append_query_results([comments.clone()])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();
        let page = service(db, Arc::clone(&transport))
            .list_page(55, 1, 3)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(!page.has_prev());

        // Page 3: the final single item, no next affordance.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[submission]])
            .append_query_results([comments])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();
        let page = service(db, Arc::clone(&transport))
            .list_page(55, 3, 3)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[tokio::test]
    async fn test_list_page_ranks_by_net_score_then_insertion() {
        let comments: Vec<comment::Model> =
            (1..=3).map(|id| create_test_comment(id, 55, None)).collect();
        // c2: +2, c1: +1, c3: -1. c1 and c2 tie orders break by id.
        let votes = vec![
            create_test_vote(300, 1, VoteValue::Up),
            create_test_vote(300, 2, VoteValue::Up),
            create_test_vote(301, 2, VoteValue::Up),
            create_test_vote(300, 3, VoteValue::Down),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_submission(
                55,
                SubmissionStatus::Published,
                Some(900),
            )]])
            .append_query_results([comments])
            .append_query_results([votes])
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let page = service(db, transport).list_page(55, 1, 3).await.unwrap();

        let order: Vec<i64> = page.items.iter().map(|i| i.comment.id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(page.items[0].tally, VoteTally { likes: 2, dislikes: 0 });
        assert_eq!(page.items[2].tally, VoteTally { likes: 0, dislikes: 1 });
    }

    #[tokio::test]
    async fn test_list_page_attaches_replies_without_consuming_slots() {
        let top = vec![create_test_comment(1, 55, None), create_test_comment(2, 55, None)];
        let replies = vec![create_test_comment(3, 55, Some(1))];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_submission(
                55,
                SubmissionStatus::Published,
                Some(900),
            )]])
            .append_query_results([top])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_query_results([replies])
            .append_query_results([Vec::<vote::Model>::new()])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let page = service(db, transport).list_page(55, 1, 3).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].replies.len(), 1);
        assert_eq!(page.items[0].replies[0].comment.id, 3);
        assert!(page.items[1].replies.is_empty());
    }

    #[tokio::test]
    async fn test_create_refused_on_pending_submission() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_submission(55, SubmissionStatus::Pending, None)]])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let result = service(db, transport).create(55, 200, "Nice!", None).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_reply_to_reply() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_submission(
                55,
                SubmissionStatus::Published,
                Some(900),
            )]])
            .append_query_results([[create_test_comment(3, 55, Some(1))]])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let result = service(db, transport)
            .create(55, 200, "so deep", Some(3))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_syncs_counter_and_notifies_followers() {
        let created = create_test_comment(1, 55, None);
        let follower = follow::Model {
            user_id: 300,
            submission_id: 55,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_submission(
                55,
                SubmissionStatus::Published,
                Some(900),
            )]])
            .append_query_results([[profile::Model {
                user_id: 200,
                alias: "NightOwl".to_string(),
                terms_accepted_at: Some(Utc::now().into()),
                created_at: Utc::now().into(),
            }]])
            .append_query_results([[created]])
            // Counter sync re-reads the submission and the count.
            .append_query_results([[create_test_submission(
                55,
                SubmissionStatus::Published,
                Some(900),
            )]])
            .append_query_results([[count_row(1)]])
            // Follower fan-out.
            .append_query_results([[follower]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let result = service(db, Arc::clone(&transport))
            .create(55, 200, "Nice!", None)
            .await
            .unwrap();

        assert_eq!(result.id, 1);

        let calls = transport.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            Outbound::EditedMarkup { message, .. } if message.message_id == 900
        )));
        assert!(calls.iter().any(|c| matches!(
            c,
            Outbound::Sent { chat_id, .. } if *chat_id == 300
        )));
    }

    #[tokio::test]
    async fn test_delete_cascades_votes_replies_and_reports() {
        let target = create_test_comment(5, 55, None);
        let reply = create_test_comment(6, 55, Some(5));
        let pending_report = report::Model {
            id: 1,
            comment_id: 5,
            reporter_id: 300,
            reason: "Spam/Scam".to_string(),
            status: report::ReportStatus::Pending,
            created_at: Utc::now().into(),
            resolved_at: None,
        };
        let mut resolved_report = pending_report.clone();
        resolved_report.status = report::ReportStatus::Resolved;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[target]])
            .append_query_results([[reply]])
            // Report resolution: pending lookups for the comment, then its
            // reply, with one update in between.
            .append_query_results([[pending_report]])
            .append_query_results([[resolved_report]])
            .append_query_results([Vec::<report::Model>::new()])
            // Counter sync after deletion: submission without a public
            // post, so the sync is a no-op.
            .append_query_results([[create_test_submission(55, SubmissionStatus::Published, None)]])
            .append_exec_results([
                // Vote cascade delete.
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
                // Report status update.
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // Comment delete (target + reply).
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();
        let transport = Arc::new(RecordingTransport::new());

        let submission_id = service(db, Arc::clone(&transport)).delete(5).await.unwrap();

        assert_eq!(submission_id, 55);
    }
}
