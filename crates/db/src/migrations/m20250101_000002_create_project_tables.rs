//! Create `project` and `sub_project` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Project::OrganizationName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubProject::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubProject::ProjectId).string_len(32).not_null())
                    .col(ColumnDef::new(SubProject::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(SubProject::MonthlyAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubProject::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sub_project_project")
                            .from(SubProject::Table, SubProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sub_project_project_id")
                    .table(SubProject::Table)
                    .col(SubProject::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubProject::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Project {
    Table,
    Id,
    Title,
    OrganizationName,
    CreatedAt,
}

#[derive(Iden)]
pub enum SubProject {
    Table,
    Id,
    ProjectId,
    Title,
    MonthlyAmountCents,
    CreatedAt,
}
