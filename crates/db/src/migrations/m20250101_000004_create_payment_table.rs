//! Create `payment` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_profile_table::Profile;
use super::m20250101_000003_create_enrollment_table::Enrollment;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payment::EnrollmentId).string_len(32).not_null())
                    .col(ColumnDef::new(Payment::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Payment::InstallmentNumber).integer().not_null())
                    .col(ColumnDef::new(Payment::ReferenceMonth).date().not_null())
                    .col(ColumnDef::new(Payment::AmountCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payment::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Payment::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Payment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_enrollment")
                            .from(Payment::Table, Payment::EnrollmentId)
                            .to(Enrollment::Table, Enrollment::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_profile")
                            .from(Payment::Table, Payment::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_user_id")
                    .table(Payment::Table)
                    .col(Payment::UserId)
                    .to_owned(),
            )
            .await?;

        // Unique: one row per installment
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_enrollment_installment")
                    .table(Payment::Table)
                    .col(Payment::EnrollmentId)
                    .col(Payment::InstallmentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Payment {
    Table,
    Id,
    EnrollmentId,
    UserId,
    InstallmentNumber,
    ReferenceMonth,
    AmountCents,
    Status,
    PaidAt,
    CreatedAt,
}
