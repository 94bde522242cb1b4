//! Vote aggregator: one row per (voter, comment), toggle-on-repeat.

use confide_common::{AppError, AppResult};
use confide_db::{
    entities::vote::{self, VoteValue},
    repositories::{BanRepository, CommentRepository, VoteRepository, VoteTally},
};
use sea_orm::Set;

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    votes: VoteRepository,
    comments: CommentRepository,
    bans: BanRepository,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(votes: VoteRepository, comments: CommentRepository, bans: BanRepository) -> Self {
        Self {
            votes,
            comments,
            bans,
        }
    }

    /// Cast a vote and return freshly recomputed counts.
    ///
    /// No prior row: insert. Same direction: delete (toggle-off).
    /// Opposite direction: overwrite (flip). The find-then-mutate window
    /// is closed at the store by the composite (voter, comment) key: a
    /// concurrent duplicate insert fails instead of producing two rows.
    pub async fn cast(
        &self,
        voter_id: i64,
        comment_id: i64,
        value: VoteValue,
    ) -> AppResult<VoteTally> {
        if self.bans.is_banned(voter_id).await? {
            return Err(AppError::Banned);
        }
        self.comments.get_by_id(comment_id).await?;

        match self.votes.find(voter_id, comment_id).await? {
            None => {
                let model = vote::ActiveModel {
                    voter_id: Set(voter_id),
                    comment_id: Set(comment_id),
                    value: Set(value),
                    created_at: Set(chrono::Utc::now().into()),
                };
                self.votes.create(model).await?;
            }
            Some(prev) if prev.value == value => {
                self.votes.delete(voter_id, comment_id).await?;
            }
            Some(prev) => {
                let mut model: vote::ActiveModel = prev.into();
                model.value = Set(value);
                self.votes.update(model).await?;
            }
        }

        // Counts are never served from a cache: moderation or concurrent
        // votes can change them between render and click.
        self.votes.tally(comment_id).await
    }

    /// Current tally for a comment.
    pub async fn tally(&self, comment_id: i64) -> AppResult<VoteTally> {
        self.votes.tally(comment_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use confide_db::entities::{ban, comment};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_comment(id: i64) -> comment::Model {
        comment::Model {
            id,
            submission_id: 55,
            parent_id: None,
            author_id: 200,
            author_label: "Anonymous".to_string(),
            text: "Nice!".to_string(),
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

    fn service(db: sea_orm::DatabaseConnection) -> VoteService {
        let db = Arc::new(db);
        VoteService::new(
            VoteRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            BanRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_first_vote_inserts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_comment(7)]])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_query_results([[create_test_vote(100, 7, VoteValue::Up)]])
            .append_query_results([[count_row(1)]])
            .append_query_results([[count_row(0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let tally = service(db).cast(100, 7, VoteValue::Up).await.unwrap();

        assert_eq!(tally, VoteTally { likes: 1, dislikes: 0 });
    }

    #[tokio::test]
    async fn test_repeat_vote_toggles_off() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_comment(7)]])
            .append_query_results([[create_test_vote(100, 7, VoteValue::Up)]])
            .append_query_results([[count_row(0)]])
            .append_query_results([[count_row(0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let tally = service(db).cast(100, 7, VoteValue::Up).await.unwrap();

        // Up then up again nets to zero.
        assert_eq!(tally, VoteTally { likes: 0, dislikes: 0 });
    }

    #[tokio::test]
    async fn test_opposite_vote_flips_without_second_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([[create_test_comment(7)]])
            .append_query_results([[create_test_vote(100, 7, VoteValue::Up)]])
            .append_query_results([[create_test_vote(100, 7, VoteValue::Down)]])
            .append_query_results([[count_row(0)]])
            .append_query_results([[count_row(1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let tally = service(db).cast(100, 7, VoteValue::Down).await.unwrap();

        assert_eq!(tally, VoteTally { likes: 0, dislikes: 1 });
    }

    #[tokio::test]
    async fn test_vote_on_missing_comment_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let result = service(db).cast(100, 9, VoteValue::Up).await;

        assert!(matches!(result, Err(AppError::CommentNotFound(9))));
    }
}
