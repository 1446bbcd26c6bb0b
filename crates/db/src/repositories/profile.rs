//! Profile repository.

use std::sync::Arc;

use crate::entities::{
    Enrollment, Payment, Profile, Report,
    enrollment::{self, EnrollmentStatus},
    payment, profile, report,
};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait, sea_query::Expr,
};

/// Linked-record counts that keep a profile from being hard-deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileDependencies {
    pub enrollments: u64,
    pub payments: u64,
    pub reports: u64,
}

impl ProfileDependencies {
    /// Whether no linked record exists.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enrollments == 0 && self.payments == 0 && self.reports == 0
    }
}

/// Outcome of a guarded profile deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Linked records appeared; nothing was deleted.
    HasDependencies(ProfileDependencies),
}

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find profiles by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Profile::find()
            .filter(profile::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::ApiToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by email or CPF, whichever matches first.
    pub async fn find_by_email_or_cpf(
        &self,
        email: &str,
        cpf: &str,
    ) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(
                profile::Column::Email
                    .eq(email.to_lowercase())
                    .or(profile::Column::Cpf.eq(cpf)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a profile.
    pub async fn update(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a profile only if no enrollment, payment or report references it.
    ///
    /// The counts and the delete run in one transaction.
    pub async fn delete_if_unreferenced(&self, id: &str) -> AppResult<DeleteOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(model) = Profile::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        else {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(DeleteOutcome::NotFound);
        };

        let deps = ProfileDependencies {
            enrollments: Enrollment::find()
                .filter(enrollment::Column::UserId.eq(id))
                .count(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            payments: Payment::find()
                .filter(payment::Column::UserId.eq(id))
                .count(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            reports: Report::find()
                .filter(report::Column::UserId.eq(id))
                .count(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        if !deps.is_empty() {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(DeleteOutcome::HasDependencies(deps));
        }

        model
            .delete(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(DeleteOutcome::Deleted)
    }

    /// Deactivate a profile and suspend its active enrollments.
    ///
    /// Returns `false` if the profile does not exist.
    pub async fn deactivate(&self, id: &str) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = Profile::update_many()
            .col_expr(profile::Column::IsActive, Expr::value(false))
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(profile::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        Enrollment::update_many()
            .col_expr(
                enrollment::Column::Status,
                Expr::value(EnrollmentStatus::Suspended),
            )
            .col_expr(
                enrollment::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(enrollment::Column::UserId.eq(id))
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    /// Reactivate a profile. Suspended enrollments stay suspended.
    ///
    /// Returns `false` if the profile does not exist.
    pub async fn reactivate(&self, id: &str) -> AppResult<bool> {
        let updated = Profile::update_many()
            .col_expr(profile::Column::IsActive, Expr::value(true))
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::profile::Role;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_profile(id: &str, name: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            cpf: "52998224725".to_string(),
            role: Role::Scholar,
            is_active: true,
            api_token: Some("test_token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let profile = create_test_profile("user1", "Ana");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_id("user1").await.unwrap();

        assert_eq!(result.unwrap().name, "Ana");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_delete_if_unreferenced_deletes() {
        let profile = create_test_profile("user1", "Ana");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(0)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let outcome = repo.delete_if_unreferenced("user1").await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_delete_if_unreferenced_refuses_with_report() {
        let profile = create_test_profile("user1", "Ana");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[count_row(2)]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let outcome = repo.delete_if_unreferenced("user1").await.unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::HasDependencies(ProfileDependencies {
                enrollments: 0,
                payments: 0,
                reports: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_delete_if_unreferenced_missing_profile() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let outcome = repo.delete_if_unreferenced("ghost").await.unwrap();

        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_deactivate_missing_profile_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert!(!repo.deactivate("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_suspends_enrollments() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert!(repo.deactivate("user1").await.unwrap());
    }
}
