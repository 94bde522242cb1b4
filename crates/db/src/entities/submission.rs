//! Submission entity (confessions awaiting or past moderation).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a submission.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SubmissionStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Submission model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Author's platform user id (visible to moderators only).
    #[sea_orm(indexed)]
    pub author_id: i64,

    /// Author's display name, shown in the review request only.
    pub author_name: String,

    /// Confession body. Moderators may overwrite it while pending.
    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Current moderation status.
    pub status: SubmissionStatus,

    /// Public channel message id, set exactly once on publication.
    #[sea_orm(nullable)]
    pub channel_message_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    /// When the moderation decision was recorded.
    #[sea_orm(nullable)]
    pub decided_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
