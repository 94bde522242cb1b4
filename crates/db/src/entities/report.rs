//! Report entity (abuse reports filed against comments).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report status.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// The reported comment was deleted.
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// A moderator decided the comment stays.
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

/// Report model.
///
/// A unique index on (reporter_id, comment_id) backs the one-report-per-pair
/// rule: a user may not file twice, even after dismissal.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The comment being reported.
    #[sea_orm(indexed)]
    pub comment_id: i64,

    /// The reporting user's platform id.
    pub reporter_id: i64,

    /// Selected report reason.
    pub reason: String,

    pub status: ReportStatus,

    pub created_at: DateTimeWithTimeZone,

    /// When the report left pending status.
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,
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
