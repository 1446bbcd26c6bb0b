//! Audit log repository.

use std::sync::Arc;

use crate::entities::{AuditLog, audit_log};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Audit log repository. Entries are only ever inserted.
#[derive(Clone)]
pub struct AuditLogRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry.
    pub async fn create(&self, model: audit_log::ActiveModel) -> AppResult<audit_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List entries, newest first, optionally filtered by action.
    pub async fn find_recent(
        &self,
        action: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<audit_log::Model>> {
        let mut query = AuditLog::find().order_by_desc(audit_log::Column::CreatedAt);

        if let Some(a) = action {
            query = query.filter(audit_log::Column::Action.eq(a));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
