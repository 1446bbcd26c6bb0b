//! In-memory state of open bulk removal dialogs.
//!
//! A session spans one eligibility check, the typed confirmation and at most
//! one execution. Sessions belong to the operator who opened them.

use std::collections::HashMap;
use std::sync::Arc;

use grantdesk_common::{AppError, AppResult};
use serde::Serialize;
use tokio::sync::RwLock;

use super::bulk_removal::ActionResult;
use super::confirmation::{ConfirmationGate, GateState};
use super::eligibility::{EligibilityReport, UserEligibility};

/// One open removal dialog.
#[derive(Debug, Clone)]
pub struct RemovalSession {
    pub id: String,
    pub actor_id: String,
    pub report: EligibilityReport,
    pub gate: ConfirmationGate,
    /// Set while the delete/deactivate calls are running.
    pub processing: bool,
    pub result: Option<ActionResult>,
    /// Unix timestamp after which the session is dropped.
    pub expires_at: i64,
}

/// What the operator sees of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalSessionView {
    pub session_id: String,
    pub users: Vec<UserEligibility>,
    pub eligible_for_deletion: Vec<String>,
    pub ineligible_for_deletion: Vec<String>,
    pub gate_state: GateState,
    pub deactivate_ineligible: bool,
    pub can_confirm: bool,
    pub processing: bool,
    /// Outcome of the execution, once it has run.
    pub result: Option<ActionResult>,
    pub expires_at: i64,
}

impl RemovalSession {
    #[must_use]
    pub fn view(&self) -> RemovalSessionView {
        RemovalSessionView {
            session_id: self.id.clone(),
            users: self.report.users().to_vec(),
            eligible_for_deletion: self
                .report
                .eligible_for_deletion()
                .map(|u| u.user_id.clone())
                .collect(),
            ineligible_for_deletion: self
                .report
                .ineligible_for_deletion()
                .map(|u| u.user_id.clone())
                .collect(),
            gate_state: self.gate.state(),
            deactivate_ineligible: self.gate.deactivate_ineligible(),
            can_confirm: !self.processing && self.result.is_none() && self.gate.can_confirm(),
            processing: self.processing,
            result: self.result.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Store of open removal sessions.
#[derive(Clone)]
pub struct RemovalSessionStore {
    sessions: Arc<RwLock<HashMap<String, RemovalSession>>>,
    ttl_secs: i64,
}

impl RemovalSessionStore {
    /// Create a store whose sessions live `ttl_secs` after their last update.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Expiry timestamp for a session touched now.
    #[must_use]
    pub fn next_expiry(&self) -> i64 {
        chrono::Utc::now().timestamp().saturating_add(self.ttl_secs)
    }

    /// Store a new session, dropping expired ones.
    pub async fn insert(&self, session: RemovalSession) {
        let now = chrono::Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at >= now);
        sessions.insert(session.id.clone(), session);
    }

    /// Apply `f` to the caller's live session and refresh its expiry.
    pub async fn update<R>(
        &self,
        id: &str,
        actor_id: &str,
        f: impl FnOnce(&mut RemovalSession) -> AppResult<R>,
    ) -> AppResult<R> {
        let now = chrono::Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;

        let expired = sessions.get(id).is_some_and(|s| s.expires_at < now);
        if expired {
            sessions.remove(id);
        }

        let session = sessions
            .get_mut(id)
            .filter(|s| s.actor_id == actor_id)
            .ok_or_else(|| AppError::NotFound("Removal session not found".to_string()))?;

        let out = f(session)?;
        session.expires_at = now.saturating_add(self.ttl_secs);
        Ok(out)
    }

    /// Current view of the caller's session.
    pub async fn view(&self, id: &str, actor_id: &str) -> AppResult<RemovalSessionView> {
        self.update(id, actor_id, |s| Ok(s.view())).await
    }

    /// Claim the session for execution.
    ///
    /// Fails with `Conflict` while another execution of the same session is
    /// running or after it has already run. Other sessions are unaffected.
    pub async fn begin_execution(
        &self,
        id: &str,
        actor_id: &str,
    ) -> AppResult<(EligibilityReport, bool)> {
        self.update(id, actor_id, |s| {
            if s.processing {
                return Err(AppError::Conflict(
                    "Removal is already being processed".to_string(),
                ));
            }
            if s.result.is_some() {
                return Err(AppError::Conflict("Removal was already executed".to_string()));
            }
            if !s.gate.can_confirm() {
                return Err(AppError::BadRequest(
                    "Removal has not been confirmed".to_string(),
                ));
            }
            s.processing = true;
            Ok((s.report.clone(), s.gate.deactivate_ineligible()))
        })
        .await
    }

    /// Store the outcome of an execution and release the session.
    pub async fn finish_execution(&self, id: &str, result: ActionResult) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.processing = false;
            session.result = Some(result);
        }
    }

    /// Release a claimed session whose execution never produced a result.
    pub async fn release_execution(&self, id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.processing = false;
        }
    }

    /// Drop expired sessions (called periodically).
    pub async fn cleanup_expired(&self) {
        let now = chrono::Utc::now().timestamp();
        self.sessions.write().await.retain(|_, s| s.expires_at >= now);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
