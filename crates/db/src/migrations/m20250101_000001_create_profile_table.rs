//! Create `profile` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profile::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Profile::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Profile::Cpf).string_len(11).not_null())
                    .col(
                        ColumnDef::new(Profile::Role)
                            .string_len(16)
                            .not_null()
                            .default("scholar"),
                    )
                    .col(
                        ColumnDef::new(Profile::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Profile::ApiToken).string_len(64))
                    .col(
                        ColumnDef::new(Profile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Profile::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique: email
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_email")
                    .table(Profile::Table)
                    .col(Profile::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique: cpf
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_cpf")
                    .table(Profile::Table)
                    .col(Profile::Cpf)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique: api_token (token authentication)
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_api_token")
                    .table(Profile::Table)
                    .col(Profile::ApiToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Profile {
    Table,
    Id,
    Name,
    Email,
    Cpf,
    Role,
    IsActive,
    ApiToken,
    CreatedAt,
    UpdatedAt,
}
