//! Create `enrollment` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_profile_table::Profile;
use super::m20250101_000002_create_project_tables::SubProject;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enrollment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollment::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Enrollment::SubProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollment::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Enrollment::StartMonth).date().not_null())
                    .col(ColumnDef::new(Enrollment::EndMonth).date().not_null())
                    .col(
                        ColumnDef::new(Enrollment::MonthlyAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Enrollment::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_profile")
                            .from(Enrollment::Table, Enrollment::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_sub_project")
                            .from(Enrollment::Table, Enrollment::SubProjectId)
                            .to(SubProject::Table, SubProject::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_user_id")
                    .table(Enrollment::Table)
                    .col(Enrollment::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_sub_project_id")
                    .table(Enrollment::Table)
                    .col(Enrollment::SubProjectId)
                    .to_owned(),
            )
            .await?;

        // At most one active enrollment per scholar
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_enrollment_one_active \
                 ON enrollment (user_id) WHERE status = 'active'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Enrollment {
    Table,
    Id,
    UserId,
    SubProjectId,
    Status,
    StartMonth,
    EndMonth,
    MonthlyAmountCents,
    CreatedAt,
    UpdatedAt,
}
