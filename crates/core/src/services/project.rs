//! Funded projects and their sub-projects.

use std::sync::Arc;

use grantdesk_common::{AppError, AppResult, IdGenerator};
use grantdesk_db::{
    entities::{project, sub_project},
    repositories::{EnrollmentRepository, ProjectRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::audit::{self, AuditEntry, AuditSink};
use super::context::AdminContext;

/// Input for creating a project.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub organization_name: String,
}

/// Input for creating a sub-project.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubProjectInput {
    pub project_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(range(min = 1))]
    pub monthly_amount_cents: i64,
}

/// Records that would be affected by deleting a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDependencies {
    pub sub_projects: u64,
    pub enrollments: u64,
}

impl ProjectDependencies {
    /// Enrollments block deletion; sub-projects are removed with the project.
    #[must_use]
    pub const fn can_delete(&self) -> bool {
        self.enrollments == 0
    }
}

/// Project service.
#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
    enrollment_repo: EnrollmentRepository,
    audit: Arc<dyn AuditSink>,
    id_gen: IdGenerator,
}

impl ProjectService {
    /// Create a new project service.
    #[must_use]
    pub fn new(
        project_repo: ProjectRepository,
        enrollment_repo: EnrollmentRepository,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            project_repo,
            enrollment_repo,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a project.
    pub async fn create(
        &self,
        ctx: &AdminContext,
        input: CreateProjectInput,
    ) -> AppResult<project::Model> {
        ctx.require_staff()?;
        input.validate()?;

        let model = project::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            organization_name: Set(input.organization_name.trim().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.project_repo.create(model).await
    }

    /// Create a sub-project under an existing project.
    pub async fn create_sub_project(
        &self,
        ctx: &AdminContext,
        input: CreateSubProjectInput,
    ) -> AppResult<sub_project::Model> {
        ctx.require_staff()?;
        input.validate()?;

        self.get(&input.project_id).await?;

        let model = sub_project::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(input.project_id),
            title: Set(input.title.trim().to_string()),
            monthly_amount_cents: Set(input.monthly_amount_cents),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.project_repo.create_sub_project(model).await
    }

    async fn get(&self, project_id: &str) -> AppResult<project::Model> {
        self.project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    /// Count what hangs off a project.
    pub async fn deletion_dependencies(&self, project_id: &str) -> AppResult<ProjectDependencies> {
        self.get(project_id).await?;

        let sub_project_ids = self.project_repo.find_sub_project_ids(project_id).await?;
        let enrollments = self
            .enrollment_repo
            .count_by_sub_projects(&sub_project_ids)
            .await?;

        Ok(ProjectDependencies {
            sub_projects: sub_project_ids.len() as u64,
            enrollments,
        })
    }

    /// Delete a project and its sub-projects. Admin only.
    ///
    /// Refused while any enrollment references one of its sub-projects.
    pub async fn delete(&self, ctx: &AdminContext, project_id: &str) -> AppResult<()> {
        ctx.require_admin()?;

        let project = self.get(project_id).await?;
        let deps = self.deletion_dependencies(project_id).await?;
        if !deps.can_delete() {
            return Err(AppError::Conflict(format!(
                "Project has {} enrollment(s)",
                deps.enrollments
            )));
        }

        self.project_repo.delete_with_sub_projects(project_id).await?;

        audit::emit(
            self.audit.as_ref(),
            ctx,
            AuditEntry::new(
                "delete_project",
                "project",
                json!({
                    "project_id": project.id,
                    "title": project.title,
                    "sub_projects": deps.sub_projects,
                }),
            ),
        )
        .await;

        tracing::info!(project_id = %project_id, actor_id = %ctx.actor_id, "Deleted project");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::audit::AuditService;
    use chrono::Utc;
    use grantdesk_db::entities::profile::Role;
    use grantdesk_db::repositories::AuditLogRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};

    fn service(db: DatabaseConnection) -> ProjectService {
        let db = Arc::new(db);
        ProjectService::new(
            ProjectRepository::new(Arc::clone(&db)),
            EnrollmentRepository::new(Arc::clone(&db)),
            Arc::new(AuditService::new(AuditLogRepository::new(db))),
        )
    }

    fn create_test_project() -> project::Model {
        project::Model {
            id: "p1".to_string(),
            title: "Soil microbiome".to_string(),
            organization_name: "Agency".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn admin() -> AdminContext {
        AdminContext::new("admin1", "Ana", Role::Admin)
    }

    #[tokio::test]
    async fn test_deletion_dependencies() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_project()]])
            .append_query_results([vec![
                maplit::btreemap! { "id" => Value::from("sp1") },
                maplit::btreemap! { "id" => Value::from("sp2") },
            ]])
            .append_query_results([[maplit::btreemap! { "num_items" => Value::BigInt(Some(3)) }]])
            .into_connection();

        let deps = service(db).deletion_dependencies("p1").await.unwrap();
        assert_eq!(deps.sub_projects, 2);
        assert_eq!(deps.enrollments, 3);
        assert!(!deps.can_delete());
    }

    #[tokio::test]
    async fn test_delete_refused_with_enrollments() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_project()]])
            .append_query_results([[create_test_project()]])
            .append_query_results([[maplit::btreemap! { "id" => Value::from("sp1") }]])
            .append_query_results([[maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) }]])
            .into_connection();

        let err = service(db).delete(&admin(), "p1").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_project() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<project::Model>::new()])
            .into_connection();

        let err = service(db).delete(&admin(), "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_manager_cannot_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let manager = AdminContext::new("m1", "Marcos", Role::Manager);

        let err = service(db).delete(&manager, "p1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
