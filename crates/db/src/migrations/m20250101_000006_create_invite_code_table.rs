//! Create `invite_code` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InviteCode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteCode::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InviteCode::Code).string_len(16).not_null())
                    .col(ColumnDef::new(InviteCode::MaxUses).integer().not_null())
                    .col(
                        ColumnDef::new(InviteCode::Uses)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(InviteCode::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(InviteCode::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(InviteCode::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invite_code_code")
                    .table(InviteCode::Table)
                    .col(InviteCode::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InviteCode::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InviteCode {
    Table,
    Id,
    Code,
    MaxUses,
    Uses,
    ExpiresAt,
    CreatedBy,
    CreatedAt,
}
