//! Invite code entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Token gating scholar self-registration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invite_code")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub code: String,

    /// How many signups the code admits.
    pub max_uses: i32,

    /// How many signups have used it.
    #[sea_orm(default_value = 0)]
    pub uses: i32,

    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
