//! Create follow table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follow::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follow::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Follow::SubmissionId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Follow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_follow")
                            .col(Follow::UserId)
                            .col(Follow::SubmissionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_submission")
                            .from(Follow::Table, Follow::SubmissionId)
                            .to(Submission::Table, Submission::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: submission_id (follower fan-out)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_submission_id")
                    .table(Follow::Table)
                    .col(Follow::SubmissionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follow::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Follow {
    Table,
    UserId,
    SubmissionId,
    CreatedAt,
}

#[derive(Iden)]
enum Submission {
    Table,
    Id,
}
