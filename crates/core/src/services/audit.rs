//! Audit trail of administrative actions.

use async_trait::async_trait;
use grantdesk_common::{AppResult, IdGenerator};
use grantdesk_db::{entities::audit_log, repositories::AuditLogRepository};
use sea_orm::Set;
use serde::Serialize;
use serde_json::Value;

use super::context::AdminContext;

/// Entity type recorded for actions on user accounts.
pub const ENTITY_PROFILE: &str = "profile";

/// One audit entry, before the actor and timestamp are attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: String,
    pub entity_type: String,
    pub details: Value,
    pub previous_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl AuditEntry {
    #[must_use]
    pub fn new(action: &str, entity_type: &str, details: Value) -> Self {
        Self {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            details,
            previous_value: None,
            new_value: None,
        }
    }

    /// Attach before/after values of the affected field.
    #[must_use]
    pub fn with_change(mut self, previous: Value, new: Value) -> Self {
        self.previous_value = Some(previous);
        self.new_value = Some(new);
        self
    }
}

/// Destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, actor: &AdminContext, entry: AuditEntry) -> AppResult<()>;
}

/// Record an entry without letting a failure reach the caller.
///
/// Audit writes are not linked to the mutation they describe; a failed write
/// is logged and dropped.
pub async fn emit(sink: &dyn AuditSink, actor: &AdminContext, entry: AuditEntry) {
    let action = entry.action.clone();
    if let Err(e) = sink.record(actor, entry).await {
        tracing::warn!(
            error = %e,
            action = %action,
            actor_id = %actor.actor_id,
            "Failed to write audit entry"
        );
    }
}

/// Audit service backed by the `audit_log` table.
#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditLogRepository,
    id_gen: IdGenerator,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub const fn new(audit_repo: AuditLogRepository) -> Self {
        Self {
            audit_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List recent entries. Admin only.
    pub async fn list(
        &self,
        ctx: &AdminContext,
        action: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<audit_log::Model>> {
        ctx.require_admin()?;
        self.audit_repo
            .find_recent(action, limit.min(100), offset)
            .await
    }
}

#[async_trait]
impl AuditSink for AuditService {
    async fn record(&self, actor: &AdminContext, entry: AuditEntry) -> AppResult<()> {
        let model = audit_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            action: Set(entry.action),
            entity_type: Set(entry.entity_type),
            details: Set(entry.details),
            previous_value: Set(entry.previous_value),
            new_value: Set(entry.new_value),
            actor_id: Set(actor.actor_id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.audit_repo.create(model).await?;
        Ok(())
    }
}
