//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_submission_table;
mod m20250101_000002_create_comment_table;
mod m20250101_000003_create_vote_table;
mod m20250101_000004_create_report_table;
mod m20250101_000005_create_profile_table;
mod m20250101_000006_create_ban_table;
mod m20250101_000007_create_follow_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_submission_table::Migration),
            Box::new(m20250101_000002_create_comment_table::Migration),
            Box::new(m20250101_000003_create_vote_table::Migration),
            Box::new(m20250101_000004_create_report_table::Migration),
            Box::new(m20250101_000005_create_profile_table::Migration),
            Box::new(m20250101_000006_create_ban_table::Migration),
            Box::new(m20250101_000007_create_follow_table::Migration),
        ]
    }
}
