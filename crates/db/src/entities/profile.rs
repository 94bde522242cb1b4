//! Profile entity (per-user alias and terms consent).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile model, keyed by the platform user id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    /// Anonymous display label used on comments.
    pub alias: String,

    /// When the user accepted the terms; None until they do.
    #[sea_orm(nullable)]
    pub terms_accepted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
