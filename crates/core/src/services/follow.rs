//! Follow service: readers subscribing to a submission's comment activity.

use confide_common::AppResult;
use confide_db::{
    entities::follow,
    repositories::{FollowRepository, SubmissionRepository},
};
use sea_orm::Set;

/// Follow service.
#[derive(Clone)]
pub struct FollowService {
    follows: FollowRepository,
    submissions: SubmissionRepository,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follows: FollowRepository, submissions: SubmissionRepository) -> Self {
        Self {
            follows,
            submissions,
        }
    }

    /// Toggle a follow. Returns whether the user now follows the
    /// submission.
    pub async fn toggle(&self, user_id: i64, submission_id: i64) -> AppResult<bool> {
        self.submissions.get_by_id(submission_id).await?;

        if self.follows.find(user_id, submission_id).await?.is_some() {
            self.follows.delete(user_id, submission_id).await?;
            return Ok(false);
        }

        let model = follow::ActiveModel {
            user_id: Set(user_id),
            submission_id: Set(submission_id),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.follows.create(model).await?;
        Ok(true)
    }

    /// User ids following a submission.
    pub async fn followers_of(&self, submission_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .follows
            .find_by_submission(submission_id)
            .await?
            .into_iter()
            .map(|f| f.user_id)
            .collect())
    }
}
