//! API endpoints.

mod admin;
mod auth;
mod enrollments;
mod projects;
mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/admin", admin::router())
        .nest("/projects", projects::router())
        .nest("/enrollments", enrollments::router())
        .nest("/reports", reports::router())
}
