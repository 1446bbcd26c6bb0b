//! Monthly report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use grantdesk_common::AppResult;
use grantdesk_core::SubmitReportInput;
use grantdesk_db::entities::report;
use serde::{Deserialize, Serialize};

use crate::{extractors::Caller, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub user_id: String,
    pub enrollment_id: String,
    pub reference_month: String,
    pub content: String,
    pub submitted_at: String,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            enrollment_id: r.enrollment_id,
            reference_month: r.reference_month.to_string(),
            content: r.content,
            submitted_at: r.submitted_at.to_rfc3339(),
        }
    }
}

/// Report listing request. Defaults to the caller's own reports.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsRequest {
    pub user_id: Option<String>,
}

async fn submit_report(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<SubmitReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.submit(&ctx, req).await?;
    Ok(ApiResponse::ok(report.into()))
}

async fn list_reports(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<ListReportsRequest>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let user_id = req.user_id.unwrap_or_else(|| ctx.actor_id.clone());
    let reports = state.report_service.list_for_user(&ctx, &user_id).await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit_report))
        .route("/list", post(list_reports))
}
