//! Enrollment repository.

use std::sync::Arc;

use crate::entities::{
    Enrollment, Payment,
    enrollment::{self, EnrollmentStatus},
    payment,
};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

/// Enrollment repository for database operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an enrollment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<enrollment::Model>> {
        Enrollment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Of the given user IDs, return those with at least one enrollment.
    pub async fn find_user_ids_with_enrollments(
        &self,
        user_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Enrollment::find()
            .filter(enrollment::Column::UserId.is_in(user_ids.to_vec()))
            .select_only()
            .column(enrollment::Column::UserId)
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the active enrollment of a scholar, if any.
    pub async fn find_active_by_user(&self, user_id: &str) -> AppResult<Option<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all enrollments of a scholar, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .order_by_desc(enrollment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count enrollments across the given sub-projects.
    pub async fn count_by_sub_projects(&self, sub_project_ids: &[String]) -> AppResult<u64> {
        if sub_project_ids.is_empty() {
            return Ok(0);
        }

        Enrollment::find()
            .filter(enrollment::Column::SubProjectId.is_in(sub_project_ids.to_vec()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an enrollment together with its installments.
    ///
    /// Both inserts run in one transaction; on any error nothing is written.
    pub async fn create_with_installments(
        &self,
        model: enrollment::ActiveModel,
        installments: Vec<payment::ActiveModel>,
    ) -> AppResult<enrollment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let enrollment = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !installments.is_empty() {
            Payment::insert_many(installments)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(enrollment)
    }
}
