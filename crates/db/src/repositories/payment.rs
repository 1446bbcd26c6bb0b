//! Payment repository.

use std::sync::Arc;

use crate::entities::{Payment, payment};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Payment repository for database operations.
#[derive(Clone)]
pub struct PaymentRepository {
    db: Arc<DatabaseConnection>,
}

impl PaymentRepository {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Of the given user IDs, return those with at least one payment.
    pub async fn find_user_ids_with_payments(
        &self,
        user_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Payment::find()
            .filter(payment::Column::UserId.is_in(user_ids.to_vec()))
            .select_only()
            .column(payment::Column::UserId)
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a payment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<payment::Model>> {
        Payment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the installments of an enrollment in order.
    pub async fn find_by_enrollment(&self, enrollment_id: &str) -> AppResult<Vec<payment::Model>> {
        Payment::find()
            .filter(payment::Column::EnrollmentId.eq(enrollment_id))
            .order_by_asc(payment::Column::InstallmentNumber)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a payment.
    pub async fn update(&self, model: payment::ActiveModel) -> AppResult<payment::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
