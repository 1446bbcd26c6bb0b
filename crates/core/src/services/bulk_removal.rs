//! Bulk scholar removal.
//!
//! One cycle: check eligibility, wait for the typed confirmation, then
//! delete the eligible users and (when the operator opted in) deactivate the
//! ineligible ones, tally the outcome and write the audit trail.
//!
//! Eligibility is not locked between the check and the mutation. A
//! dependency created in between makes that user's delete fail inside the
//! user administration procedure, and the failure is surfaced in the result
//! notices.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use grantdesk_common::{AppError, AppResult, IdGenerator, config::RemovalConfig};
use serde::Serialize;
use serde_json::json;

use super::audit::{self, AuditEntry, AuditSink, ENTITY_PROFILE};
use super::confirmation::ConfirmationGate;
use super::context::AdminContext;
use super::eligibility::{EligibilityReport, EligibilityService, UserEligibility};
use super::removal_session::{RemovalSession, RemovalSessionStore, RemovalSessionView};
use super::selection::Selection;
use super::user_admin::{ActionResults, FailedUser, GatewayError, UserAction, UserAdminGateway};

const GENERIC_CALL_FAILURE: &str = "Could not reach the user administration service";

/// A user scheduled for one bucket of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUser {
    pub id: String,
    pub name: String,
}

impl From<&UserEligibility> for PlannedUser {
    fn from(u: &UserEligibility) -> Self {
        Self {
            id: u.user_id.clone(),
            name: u.name.clone(),
        }
    }
}

/// Which users get which call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    pub delete: Vec<PlannedUser>,
    pub deactivate: Vec<PlannedUser>,
    /// Ineligible users left alone because deactivation was not requested.
    pub ignored: Vec<PlannedUser>,
}

impl RemovalPlan {
    /// Split a checked selection into buckets.
    #[must_use]
    pub fn from_report(report: &EligibilityReport, deactivate_ineligible: bool) -> Self {
        let delete = report.eligible_for_deletion().map(PlannedUser::from).collect();
        let ineligible: Vec<PlannedUser> = report
            .ineligible_for_deletion()
            .map(PlannedUser::from)
            .collect();

        if deactivate_ineligible {
            Self {
                delete,
                deactivate: ineligible,
                ignored: Vec::new(),
            }
        } else {
            Self {
                delete,
                deactivate: Vec::new(),
                ignored: ineligible,
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delete.len() + self.deactivate.len() + self.ignored.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ids(users: &[PlannedUser]) -> Vec<String> {
    users.iter().map(|u| u.id.clone()).collect()
}

fn names(users: &[PlannedUser]) -> Vec<String> {
    users.iter().map(|u| u.name.clone()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Operator-facing message about one part of the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Support reference logged alongside the failure.
    pub correlation_code: Option<String>,
}

impl Notice {
    fn info(message: String) -> Self {
        Self {
            level: NoticeLevel::Info,
            message,
            correlation_code: None,
        }
    }

    fn error(message: &str, code: String) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: format!("{message} (ref: {code})"),
            correlation_code: Some(code),
        }
    }
}

/// Tally of one removal cycle.
///
/// `deleted + deactivated + ignored + failed` equals the number of users in
/// the cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub deleted: usize,
    pub deactivated: usize,
    pub ignored: usize,
    pub failed: usize,
    pub deleted_ids: Vec<String>,
    pub deactivated_ids: Vec<String>,
    pub deleted_names: Vec<String>,
    pub deactivated_names: Vec<String>,
    pub ignored_names: Vec<String>,
    pub failed_names: Vec<String>,
    pub notices: Vec<Notice>,
}

/// Outcome of one gateway call, split by planned user.
struct Settled {
    succeeded: Vec<PlannedUser>,
    failed: Vec<(PlannedUser, String)>,
    notice: Option<Notice>,
}

const fn labels(action: UserAction) -> (&'static str, &'static str) {
    match action {
        UserAction::Delete => ("Deletion", "deleted"),
        UserAction::Deactivate => ("Deactivation", "deactivated"),
        UserAction::Reactivate => ("Reactivation", "reactivated"),
    }
}

/// Match a call outcome against the users it was made for.
///
/// Users the procedure reports neither as succeeded nor failed count as
/// failed. Ids it reports that were not planned are ignored.
fn settle(
    action: UserAction,
    planned: &[PlannedUser],
    outcome: Option<Result<ActionResults, GatewayError>>,
    id_gen: &IdGenerator,
) -> Settled {
    let (label, past) = labels(action);

    let results = match outcome {
        None => {
            return Settled {
                succeeded: Vec::new(),
                failed: planned
                    .iter()
                    .map(|u| (u.clone(), "not attempted".to_string()))
                    .collect(),
                notice: None,
            };
        }
        Some(Err(e)) => {
            let code = id_gen.generate_correlation_code();
            tracing::error!(
                error = %e,
                correlation_code = %code,
                action = action.as_str(),
                users = planned.len(),
                "User administration call failed"
            );
            let message = e.operator_message().unwrap_or(GENERIC_CALL_FAILURE);
            let reason = message.to_string();
            return Settled {
                succeeded: Vec::new(),
                failed: planned.iter().map(|u| (u.clone(), reason.clone())).collect(),
                notice: Some(Notice::error(&format!("{label} failed: {message}"), code)),
            };
        }
        Some(Ok(results)) => results,
    };

    let success: HashSet<&str> = results.success.iter().map(String::as_str).collect();
    let errors: HashMap<&str, &str> = results
        .failed
        .iter()
        .map(|f| (f.id.as_str(), f.error.as_str()))
        .collect();

    let mut settled = Settled {
        succeeded: Vec::new(),
        failed: Vec::new(),
        notice: None,
    };
    for user in planned {
        if success.contains(user.id.as_str()) {
            settled.succeeded.push(user.clone());
        } else {
            let reason = errors
                .get(user.id.as_str())
                .map_or_else(|| "no result returned".to_string(), |e| (*e).to_string());
            settled.failed.push((user.clone(), reason));
        }
    }

    settled.notice = if settled.failed.is_empty() {
        (!settled.succeeded.is_empty())
            .then(|| Notice::info(format!("{} user(s) {past}", settled.succeeded.len())))
    } else {
        let code = id_gen.generate_correlation_code();
        let reasons = settled
            .failed
            .iter()
            .map(|(u, reason)| format!("{}: {reason}", u.name))
            .collect::<Vec<_>>()
            .join("; ");
        tracing::warn!(
            correlation_code = %code,
            action = action.as_str(),
            failed = settled.failed.len(),
            reasons = %reasons,
            "User administration call partially failed"
        );
        Some(Notice::error(
            &format!(
                "{label}: {} processed, {} failed: {reasons}",
                settled.succeeded.len(),
                settled.failed.len()
            ),
            code,
        ))
    };

    settled
}

/// Merge the delete and deactivate outcomes of one cycle.
///
/// `None` means the call was not made because its bucket was empty.
#[must_use]
pub fn aggregate(
    plan: &RemovalPlan,
    delete: Option<Result<ActionResults, GatewayError>>,
    deactivate: Option<Result<ActionResults, GatewayError>>,
    id_gen: &IdGenerator,
) -> ActionResult {
    let deleted = settle(UserAction::Delete, &plan.delete, delete, id_gen);
    let deactivated = settle(UserAction::Deactivate, &plan.deactivate, deactivate, id_gen);

    let mut notices: Vec<Notice> = [deleted.notice, deactivated.notice]
        .into_iter()
        .flatten()
        .collect();
    if !plan.ignored.is_empty() {
        notices.push(Notice::info(format!(
            "{} user(s) with linked records left unchanged",
            plan.ignored.len()
        )));
    }

    let failed: Vec<&PlannedUser> = deleted
        .failed
        .iter()
        .chain(&deactivated.failed)
        .map(|(u, _)| u)
        .collect();

    ActionResult {
        deleted: deleted.succeeded.len(),
        deactivated: deactivated.succeeded.len(),
        ignored: plan.ignored.len(),
        failed: failed.len(),
        deleted_ids: ids(&deleted.succeeded),
        deactivated_ids: ids(&deactivated.succeeded),
        deleted_names: names(&deleted.succeeded),
        deactivated_names: names(&deactivated.succeeded),
        ignored_names: names(&plan.ignored),
        failed_names: failed.iter().map(|u| u.name.clone()).collect(),
        notices,
    }
}

/// Outcome of a reactivation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivationResult {
    pub reactivated: usize,
    pub reactivated_ids: Vec<String>,
    pub failed: Vec<FailedUser>,
    pub notices: Vec<Notice>,
}

/// Bulk removal service.
#[derive(Clone)]
pub struct BulkRemovalService {
    eligibility: EligibilityService,
    gateway: Arc<dyn UserAdminGateway>,
    audit: Arc<dyn AuditSink>,
    sessions: RemovalSessionStore,
    confirmation_word: String,
    id_gen: IdGenerator,
}

impl BulkRemovalService {
    /// Create a new bulk removal service.
    #[must_use]
    pub fn new(
        eligibility: EligibilityService,
        gateway: Arc<dyn UserAdminGateway>,
        audit: Arc<dyn AuditSink>,
        config: &RemovalConfig,
    ) -> Self {
        Self {
            eligibility,
            gateway,
            audit,
            sessions: RemovalSessionStore::new(config.session_ttl_secs),
            confirmation_word: config.confirmation_word.clone(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Session store, for periodic cleanup.
    #[must_use]
    pub const fn sessions(&self) -> &RemovalSessionStore {
        &self.sessions
    }

    /// Check the selected users and open a removal session for them.
    pub async fn check(
        &self,
        ctx: &AdminContext,
        user_ids: &[String],
    ) -> AppResult<RemovalSessionView> {
        ctx.require_admin()?;

        let selection = Selection::from_ids(user_ids);
        let report = self.eligibility.check(&selection).await?;

        let mut gate = ConfirmationGate::new(self.confirmation_word.clone());
        gate.check_completed(&report);

        let session = RemovalSession {
            id: self.id_gen.generate(),
            actor_id: ctx.actor_id.clone(),
            report,
            gate,
            processing: false,
            result: None,
            expires_at: self.sessions.next_expiry(),
        };
        let view = session.view();

        tracing::info!(
            session_id = %view.session_id,
            actor_id = %ctx.actor_id,
            users = view.users.len(),
            eligible = view.eligible_for_deletion.len(),
            "Opened removal session"
        );

        self.sessions.insert(session).await;
        Ok(view)
    }

    /// Update the typed confirmation text and the deactivation opt-in.
    pub async fn update_confirmation(
        &self,
        ctx: &AdminContext,
        session_id: &str,
        text: &str,
        deactivate_ineligible: bool,
    ) -> AppResult<RemovalSessionView> {
        ctx.require_admin()?;

        self.sessions
            .update(session_id, &ctx.actor_id, |s| {
                s.gate.set_deactivate_ineligible(deactivate_ineligible);
                s.gate.set_text(text);
                Ok(s.view())
            })
            .await
    }

    /// Execute a confirmed session.
    ///
    /// The calls run on their own task, so the session is settled and the
    /// result stored even when the caller goes away mid-dispatch.
    pub async fn execute(&self, ctx: &AdminContext, session_id: &str) -> AppResult<ActionResult> {
        ctx.require_admin()?;

        let (report, deactivate_ineligible) = self
            .sessions
            .begin_execution(session_id, &ctx.actor_id)
            .await?;
        let plan = RemovalPlan::from_report(&report, deactivate_ineligible);

        let service = self.clone();
        let actor = ctx.clone();
        let id = session_id.to_string();
        let task = tokio::spawn(async move {
            let result = service.run(&actor, &plan).await;
            service.sessions.finish_execution(&id, result.clone()).await;
            result
        });

        match task.await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Removal task aborted");
                self.sessions.release_execution(session_id).await;
                Err(AppError::Internal("Removal did not complete".to_string()))
            }
        }
    }

    /// Dispatch a plan, tally it and write the audit trail.
    ///
    /// Calls run one after the other, delete first. Empty buckets make no call.
    pub async fn run(&self, ctx: &AdminContext, plan: &RemovalPlan) -> ActionResult {
        let delete = if plan.delete.is_empty() {
            None
        } else {
            Some(
                self.gateway
                    .execute(UserAction::Delete, &ids(&plan.delete))
                    .await,
            )
        };

        let deactivate = if plan.deactivate.is_empty() {
            None
        } else {
            Some(
                self.gateway
                    .execute(UserAction::Deactivate, &ids(&plan.deactivate))
                    .await,
            )
        };

        let result = aggregate(plan, delete, deactivate, &self.id_gen);

        if result.deleted > 0 {
            let entry = AuditEntry::new(
                "bulk_delete_users",
                ENTITY_PROFILE,
                json!({
                    "count": result.deleted,
                    "user_ids": result.deleted_ids,
                    "names": result.deleted_names,
                }),
            );
            audit::emit(self.audit.as_ref(), ctx, entry).await;
        }

        if result.deactivated > 0 {
            let entry = AuditEntry::new(
                "bulk_deactivate_users",
                ENTITY_PROFILE,
                json!({
                    "count": result.deactivated,
                    "user_ids": result.deactivated_ids,
                    "names": result.deactivated_names,
                }),
            )
            .with_change(json!({"status": "active"}), json!({"status": "inactive"}));
            audit::emit(self.audit.as_ref(), ctx, entry).await;
        }

        tracing::info!(
            actor_id = %ctx.actor_id,
            deleted = result.deleted,
            deactivated = result.deactivated,
            ignored = result.ignored,
            failed = result.failed,
            "Bulk removal finished"
        );

        result
    }

    /// Reactivate previously deactivated users.
    pub async fn reactivate(
        &self,
        ctx: &AdminContext,
        user_ids: &[String],
    ) -> AppResult<ReactivationResult> {
        ctx.require_admin()?;

        let selection = Selection::from_ids(user_ids);
        if selection.is_empty() {
            return Err(AppError::Validation(
                "At least one user must be selected".to_string(),
            ));
        }

        let planned: Vec<PlannedUser> = selection
            .as_slice()
            .iter()
            .map(|id| PlannedUser {
                id: id.clone(),
                name: id.clone(),
            })
            .collect();

        let outcome = self
            .gateway
            .execute(UserAction::Reactivate, selection.as_slice())
            .await;
        let settled = settle(UserAction::Reactivate, &planned, Some(outcome), &self.id_gen);

        let result = ReactivationResult {
            reactivated: settled.succeeded.len(),
            reactivated_ids: ids(&settled.succeeded),
            failed: settled
                .failed
                .into_iter()
                .map(|(u, error)| FailedUser { id: u.id, error })
                .collect(),
            notices: settled.notice.into_iter().collect(),
        };

        if result.reactivated > 0 {
            let entry = AuditEntry::new(
                "reactivate_users",
                ENTITY_PROFILE,
                json!({
                    "count": result.reactivated,
                    "user_ids": result.reactivated_ids,
                }),
            )
            .with_change(json!({"status": "inactive"}), json!({"status": "active"}));
            audit::emit(self.audit.as_ref(), ctx, entry).await;
        }

        Ok(result)
    }
}
