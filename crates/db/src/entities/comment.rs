//! Comment entity (reader engagement under a published submission).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Comment model.
///
/// `parent_id` is null for top-level comments and points at a top-level
/// comment for replies; threads are exactly one level deep. Like/dislike
/// counts are always derived from the vote table, never stored here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The submission this comment belongs to.
    #[sea_orm(indexed)]
    pub submission_id: i64,

    /// Parent comment for one-level-deep replies.
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<i64>,

    /// Commenter's platform user id (visible to moderators only).
    pub author_id: i64,

    /// Anonymous display label captured at creation time.
    pub author_label: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission::Entity",
        from = "Column::SubmissionId",
        to = "super::submission::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,

    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
