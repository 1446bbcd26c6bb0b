//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, report};
use chrono::NaiveDate;
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Of the given user IDs, return those with at least one report.
    pub async fn find_user_ids_with_reports(&self, user_ids: &[String]) -> AppResult<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Report::find()
            .filter(report::Column::UserId.is_in(user_ids.to_vec()))
            .select_only()
            .column(report::Column::UserId)
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the report a scholar submitted for a month.
    pub async fn find_by_user_and_month(
        &self,
        user_id: &str,
        month: NaiveDate,
    ) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .filter(report::Column::ReferenceMonth.eq(month))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a scholar's reports, newest month first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .order_by_desc(report::Column::ReferenceMonth)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_user_ids_with_reports() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! { "user_id" => sea_orm::Value::from("user1") },
                    maplit::btreemap! { "user_id" => sea_orm::Value::from("user3") },
                ]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let ids = repo
            .find_user_ids_with_reports(&[
                "user1".to_string(),
                "user2".to_string(),
                "user3".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(ids, vec!["user1".to_string(), "user3".to_string()]);
    }

    #[tokio::test]
    async fn test_find_by_user_and_month_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let month = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(repo.find_by_user_and_month("user1", month).await.unwrap().is_none());
    }
}
