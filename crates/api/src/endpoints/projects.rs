//! Project endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use grantdesk_common::AppResult;
use grantdesk_core::{CreateProjectInput, CreateSubProjectInput, ProjectDependencies};
use grantdesk_db::entities::{project, sub_project};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::Caller,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Project response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub organization_name: String,
    pub created_at: String,
}

impl From<project::Model> for ProjectResponse {
    fn from(project: project::Model) -> Self {
        Self {
            id: project.id,
            title: project.title,
            organization_name: project.organization_name,
            created_at: project.created_at.to_rfc3339(),
        }
    }
}

/// Sub-project response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProjectResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub monthly_amount_cents: i64,
    pub created_at: String,
}

impl From<sub_project::Model> for SubProjectResponse {
    fn from(sub: sub_project::Model) -> Self {
        Self {
            id: sub.id,
            project_id: sub.project_id,
            title: sub.title,
            monthly_amount_cents: sub.monthly_amount_cents,
            created_at: sub.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdRequest {
    pub project_id: String,
}

async fn create_project(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<CreateProjectInput>,
) -> AppResult<ApiResponse<ProjectResponse>> {
    let project = state.project_service.create(&ctx, req).await?;
    Ok(ApiResponse::ok(project.into()))
}

async fn create_sub_project(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<CreateSubProjectInput>,
) -> AppResult<ApiResponse<SubProjectResponse>> {
    let sub = state.project_service.create_sub_project(&ctx, req).await?;
    Ok(ApiResponse::ok(sub.into()))
}

/// What deleting a project would touch.
async fn deletion_check(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<ProjectIdRequest>,
) -> AppResult<ApiResponse<ProjectDependencies>> {
    ctx.require_staff()?;
    let deps = state
        .project_service
        .deletion_dependencies(&req.project_id)
        .await?;
    Ok(ApiResponse::ok(deps))
}

async fn delete_project(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<ProjectIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.project_service.delete(&ctx, &req.project_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_project))
        .route("/sub-projects/create", post(create_sub_project))
        .route("/deletion-check", post(deletion_check))
        .route("/delete", post(delete_project))
}
