//! Admin endpoints: bulk user removal, reactivation, audit trail, invites.

use axum::{Json, Router, extract::State, routing::post};
use grantdesk_common::AppResult;
use grantdesk_core::{ActionResult, CreateInviteInput, ReactivationResult, RemovalSessionView};
use grantdesk_db::entities::{audit_log, invite_code};
use serde::{Deserialize, Serialize};

use crate::{extractors::Caller, middleware::AppState, response::ApiResponse};

/// Request carrying a list of user IDs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdsRequest {
    pub user_ids: Vec<String>,
}

/// Request addressing a removal session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: String,
}

/// Confirmation text update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTextRequest {
    pub session_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub deactivate_ineligible: bool,
}

/// Outcome of an executed removal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub result: ActionResult,
    /// The caller should reload its user list.
    pub refresh: bool,
}

/// Audit log listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogsRequest {
    pub action: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Audit log entry response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: String,
    pub action: String,
    pub entity_type: String,
    pub details: serde_json::Value,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub actor_id: String,
    pub created_at: String,
}

impl From<audit_log::Model> for AuditLogResponse {
    fn from(entry: audit_log::Model) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            entity_type: entry.entity_type,
            details: entry.details,
            previous_value: entry.previous_value,
            new_value: entry.new_value,
            actor_id: entry.actor_id,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Invite code response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: String,
    pub code: String,
    pub max_uses: i32,
    pub uses: i32,
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<invite_code::Model> for InviteResponse {
    fn from(invite: invite_code::Model) -> Self {
        Self {
            id: invite.id,
            code: invite.code,
            max_uses: invite.max_uses,
            uses: invite.uses,
            expires_at: invite.expires_at.map(|t| t.to_rfc3339()),
            created_at: invite.created_at.to_rfc3339(),
        }
    }
}

// ========== Bulk Removal ==========

/// Check eligibility of the selected users and open a removal session.
async fn removal_check(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<UserIdsRequest>,
) -> AppResult<ApiResponse<RemovalSessionView>> {
    let view = state
        .bulk_removal_service
        .check(&ctx, &req.user_ids)
        .await?;
    Ok(ApiResponse::ok(view))
}

/// Current state of a removal session.
async fn removal_show(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> AppResult<ApiResponse<RemovalSessionView>> {
    ctx.require_admin()?;
    let view = state
        .bulk_removal_service
        .sessions()
        .view(&req.session_id, &ctx.actor_id)
        .await?;
    Ok(ApiResponse::ok(view))
}

/// Update the typed confirmation word and the deactivation opt-in.
async fn removal_confirm_text(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<ConfirmTextRequest>,
) -> AppResult<ApiResponse<RemovalSessionView>> {
    let view = state
        .bulk_removal_service
        .update_confirmation(&ctx, &req.session_id, &req.text, req.deactivate_ineligible)
        .await?;
    Ok(ApiResponse::ok(view))
}

/// Execute a confirmed removal session.
async fn removal_execute(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> AppResult<ApiResponse<ExecuteResponse>> {
    let result = state
        .bulk_removal_service
        .execute(&ctx, &req.session_id)
        .await?;
    Ok(ApiResponse::ok(ExecuteResponse {
        result,
        refresh: true,
    }))
}

/// Reactivate deactivated users.
async fn reactivate_users(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<UserIdsRequest>,
) -> AppResult<ApiResponse<ReactivationResult>> {
    let result = state
        .bulk_removal_service
        .reactivate(&ctx, &req.user_ids)
        .await?;
    Ok(ApiResponse::ok(result))
}

// ========== Audit ==========

/// List recent audit entries.
async fn audit_logs(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<AuditLogsRequest>,
) -> AppResult<ApiResponse<Vec<AuditLogResponse>>> {
    let entries = state
        .audit_service
        .list(&ctx, req.action.as_deref(), req.limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(entries.into_iter().map(Into::into).collect()))
}

// ========== Invites ==========

/// Create an invite code.
async fn create_invite(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<CreateInviteInput>,
) -> AppResult<ApiResponse<InviteResponse>> {
    let invite = state.invite_service.create_invite(&ctx, req).await?;
    Ok(ApiResponse::ok(invite.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Bulk removal
        .route("/users/removal/check", post(removal_check))
        .route("/users/removal/show", post(removal_show))
        .route("/users/removal/confirm-text", post(removal_confirm_text))
        .route("/users/removal/execute", post(removal_execute))
        .route("/users/reactivate", post(reactivate_users))
        // Audit
        .route("/audit-logs", post(audit_logs))
        // Invites
        .route("/invites/create", post(create_invite))
}
