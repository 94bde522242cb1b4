//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::VoterId).big_integer().not_null())
                    .col(ColumnDef::new(Vote::CommentId).big_integer().not_null())
                    .col(ColumnDef::new(Vote::Value).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Composite key: one vote row per (voter, comment). Two
                    // concurrent first votes race on read-then-write; the key
                    // makes the loser fail instead of inserting a second row.
                    .primary_key(
                        Index::create()
                            .name("pk_vote")
                            .col(Vote::VoterId)
                            .col(Vote::CommentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_comment")
                            .from(Vote::Table, Vote::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: comment_id (tally queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_comment_id")
                    .table(Vote::Table)
                    .col(Vote::CommentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    VoterId,
    CommentId,
    Value,
    CreatedAt,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
}
