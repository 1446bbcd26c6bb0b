//! Project repository (projects and their sub-projects).

use std::sync::Arc;

use crate::entities::{Project, SubProject, project, sub_project};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};

/// Project repository for database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a project by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a sub-project by ID.
    pub async fn find_sub_project(&self, id: &str) -> AppResult<Option<sub_project::Model>> {
        SubProject::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the sub-projects of a project.
    pub async fn find_sub_project_ids(&self, project_id: &str) -> AppResult<Vec<String>> {
        SubProject::find()
            .filter(sub_project::Column::ProjectId.eq(project_id))
            .select_only()
            .column(sub_project::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new project.
    pub async fn create(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new sub-project.
    pub async fn create_sub_project(
        &self,
        model: sub_project::ActiveModel,
    ) -> AppResult<sub_project::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a project together with its sub-projects.
    pub async fn delete_with_sub_projects(&self, project_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        SubProject::delete_many()
            .filter(sub_project::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Project::delete_by_id(project_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
