//! Audit log entity.
//!
//! Rows are insert-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Action name, e.g. `bulk_delete_users`.
    #[sea_orm(indexed)]
    pub action: String,

    /// Kind of entity affected, e.g. `profile`.
    pub entity_type: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub previous_value: Option<Json>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub new_value: Option<Json>,

    #[sea_orm(indexed)]
    pub actor_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
