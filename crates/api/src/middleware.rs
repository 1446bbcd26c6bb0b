//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use grantdesk_core::{
    AuditService, BulkRemovalService, EnrollmentService, InviteService, ProfileService,
    ProjectService, ReportService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub bulk_removal_service: BulkRemovalService,
    pub audit_service: AuditService,
    pub invite_service: InviteService,
    pub enrollment_service: EnrollmentService,
    pub report_service: ReportService,
    pub project_service: ProjectService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its profile and stores it in the request
/// extensions. Requests without a valid token pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.profile_service.authenticate_by_token(token).await {
            Ok(profile) => {
                req.extensions_mut().insert(profile);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
