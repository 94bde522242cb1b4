//! Create submission table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submission::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submission::AuthorId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Submission::AuthorName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submission::Text).text().not_null())
                    .col(
                        ColumnDef::new(Submission::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Submission::ChannelMessageId).big_integer())
                    .col(
                        ColumnDef::new(Submission::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Submission::DecidedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for listing a user's submissions)
        manager
            .create_index(
                Index::create()
                    .name("idx_submission_author_id")
                    .table(Submission::Table)
                    .col(Submission::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: status (moderation queue scans)
        manager
            .create_index(
                Index::create()
                    .name("idx_submission_status")
                    .table(Submission::Table)
                    .col(Submission::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submission::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Submission {
    Table,
    Id,
    AuthorId,
    AuthorName,
    Text,
    Status,
    ChannelMessageId,
    CreatedAt,
    DecidedAt,
}
