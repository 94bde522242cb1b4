//! Ban entity (users barred from submitting and engaging).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ban model, keyed by the banned user's platform id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ban")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    /// The moderator who issued the ban.
    pub moderator_id: i64,

    pub reason: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
