//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use confide_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Derived like/dislike counts for one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub likes: u64,
    pub dislikes: u64,
}

impl VoteTally {
    /// Net score (likes minus dislikes) used for comment ranking.
    #[must_use]
    pub const fn net(&self) -> i64 {
        self.likes as i64 - self.dislikes as i64
    }
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a voter's vote on a comment.
    pub async fn find(&self, voter_id: i64, comment_id: i64) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::VoterId.eq(voter_id))
            .filter(vote::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite an existing vote (direction flip).
    pub async fn update(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a voter's vote on a comment (toggle-off).
    pub async fn delete(&self, voter_id: i64, comment_id: i64) -> AppResult<()> {
        Vote::delete_many()
            .filter(vote::Column::VoterId.eq(voter_id))
            .filter(vote::Column::CommentId.eq(comment_id))
            .exec(self.db.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove all votes on the given comments. Returns rows removed.
    pub async fn delete_by_comments(&self, comment_ids: &[i64]) -> AppResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }

        Vote::delete_many()
            .filter(vote::Column::CommentId.is_in(comment_ids.iter().copied()))
            .exec(self.db.as_ref())
            .await
            .map(|res| res.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recompute the live tally for one comment.
    pub async fn tally(&self, comment_id: i64) -> AppResult<VoteTally> {
        let likes = Vote::find()
            .filter(vote::Column::CommentId.eq(comment_id))
            .filter(vote::Column::Value.eq(vote::VoteValue::Up))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let dislikes = Vote::find()
            .filter(vote::Column::CommentId.eq(comment_id))
            .filter(vote::Column::Value.eq(vote::VoteValue::Down))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(VoteTally { likes, dislikes })
    }

    /// Get every vote row on the given comments in one query, for page
    /// rendering.
    pub async fn find_by_comments(&self, comment_ids: &[i64]) -> AppResult<Vec<vote::Model>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }

        Vote::find()
            .filter(vote::Column::CommentId.is_in(comment_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::vote::VoteValue;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_vote(voter_id: i64, comment_id: i64, value: VoteValue) -> vote::Model {
        vote::Model {
            voter_id,
            comment_id,
            value,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_net_score() {
        let tally = VoteTally { likes: 2, dislikes: 5 };
        assert_eq!(tally.net(), -3);
    }

    #[tokio::test]
    async fn test_find_existing_vote() {
        let vote = create_test_vote(100, 1, VoteValue::Up);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find(100, 1).await.unwrap();

        assert_eq!(result, Some(vote));
    }

    #[tokio::test]
    async fn test_find_no_vote() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find(100, 1).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_tally() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let tally = repo.tally(1).await.unwrap();

        assert_eq!(tally, VoteTally { likes: 3, dislikes: 1 });
        assert_eq!(tally.net(), 2);
    }

    #[tokio::test]
    async fn test_delete_by_comments() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let removed = repo.delete_by_comments(&[1, 2]).await.unwrap();

        assert_eq!(removed, 4);
    }

    #[tokio::test]
    async fn test_find_by_comments_empty_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_comments(&[]).await.unwrap();

        assert!(result.is_empty());
    }
}
