//! Vote entity (per-reader like/dislike on a comment).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum VoteValue {
    /// A like, contributing +1 to the net score.
    #[sea_orm(string_value = "up")]
    Up,
    /// A dislike, contributing -1 to the net score.
    #[sea_orm(string_value = "down")]
    Down,
}

/// Vote model.
///
/// The composite primary key (voter_id, comment_id) is the invariant: at
/// most one row per voter per comment. Repeating a vote deletes the row,
/// voting the other way overwrites it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub voter_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub comment_id: i64,

    pub value: VoteValue,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id",
        on_delete = "Cascade"
    )]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
