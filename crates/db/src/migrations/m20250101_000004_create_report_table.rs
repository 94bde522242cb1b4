//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::CommentId).big_integer().not_null())
                    .col(ColumnDef::new(Report::ReporterId).big_integer().not_null())
                    .col(ColumnDef::new(Report::Reason).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comment")
                            .from(Report::Table, Report::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (reporter_id, comment_id) - one report per user per
        // comment, regardless of status
        manager
            .create_index(
                Index::create()
                    .name("idx_report_reporter_comment")
                    .table(Report::Table)
                    .col(Report::ReporterId)
                    .col(Report::CommentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: comment_id (bulk resolution on delete)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_comment_id")
                    .table(Report::Table)
                    .col(Report::CommentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    CommentId,
    ReporterId,
    Reason,
    Status,
    CreatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
}
