//! Create `report` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_profile_table::Profile;

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
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::EnrollmentId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::ReferenceMonth).date().not_null())
                    .col(ColumnDef::new(Report::Content).text().not_null())
                    .col(
                        ColumnDef::new(Report::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_profile")
                            .from(Report::Table, Report::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one report per scholar per month
        manager
            .create_index(
                Index::create()
                    .name("idx_report_user_month")
                    .table(Report::Table)
                    .col(Report::UserId)
                    .col(Report::ReferenceMonth)
                    .unique()
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
    UserId,
    EnrollmentId,
    ReferenceMonth,
    Content,
    SubmittedAt,
}
