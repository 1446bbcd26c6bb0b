//! Signup and current-user endpoints.

use axum::{Json, Router, extract::State, routing::post};
use grantdesk_common::AppResult;
use grantdesk_core::SignupInput;
use grantdesk_db::entities::profile::{self, Role};
use serde::Serialize;

use crate::{
    extractors::{AuthUser, Caller},
    middleware::AppState,
    response::ApiResponse,
};

/// Profile response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl From<profile::Model> for ProfileResponse {
    fn from(profile: profile::Model) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            is_active: profile.is_active,
            created_at: profile.created_at.to_rfc3339(),
        }
    }
}

/// Signup response, carrying the new API token once.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub token: Option<String>,
}

/// Register a scholar with an invite code.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupInput>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let profile = state.invite_service.signup(req).await?;
    let token = profile.api_token.clone();
    Ok(ApiResponse::ok(SignupResponse {
        profile: profile.into(),
        token,
    }))
}

/// The signed-in profile.
async fn me(AuthUser(profile): AuthUser) -> AppResult<ApiResponse<ProfileResponse>> {
    Ok(ApiResponse::ok(profile.into()))
}

/// Request for a single profile.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowUserRequest {
    pub user_id: String,
}

/// Show a profile.
async fn show_user(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<ShowUserRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.profile_service.get(&ctx, &req.user_id).await?;
    Ok(ApiResponse::ok(profile.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/i", post(me))
        .route("/users/show", post(show_user))
}
