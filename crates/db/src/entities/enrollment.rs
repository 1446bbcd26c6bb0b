//! Enrollment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Scholar is currently funded.
    #[sea_orm(string_value = "active")]
    Active,
    /// Funding paused, e.g. after the scholar was deactivated.
    #[sea_orm(string_value = "suspended")]
    Suspended,
    /// Funding period finished.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Enrollment was cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Link between a scholar and a sub-project.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub sub_project_id: String,

    pub status: EnrollmentStatus,

    /// First funded month (day is always 1).
    pub start_month: Date,

    /// Last funded month (day is always 1).
    pub end_month: Date,

    pub monthly_amount_cents: i64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id",
        on_delete = "Restrict"
    )]
    Profile,

    #[sea_orm(
        belongs_to = "super::sub_project::Entity",
        from = "Column::SubProjectId",
        to = "super::sub_project::Column::Id",
        on_delete = "Restrict"
    )]
    SubProject,

    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::sub_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubProject.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
