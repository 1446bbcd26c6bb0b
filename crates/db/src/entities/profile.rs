//! Profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Portal role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Manages projects and enrollments.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Scholarship holder.
    #[sea_orm(string_value = "scholar")]
    Scholar,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// CPF, 11 digits
    #[sea_orm(unique)]
    pub cpf: String,

    pub role: Role,

    /// Cleared when an administrator deactivates the account
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// API access token
    #[sea_orm(unique, nullable)]
    pub api_token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,

    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
