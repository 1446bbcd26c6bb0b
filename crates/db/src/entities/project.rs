//! Project entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A funded research project.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Project title.
    pub title: String,
    /// Funding or host organization.
    pub organization_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sub_project::Entity")]
    SubProjects,
}

impl Related<super::sub_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubProjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
