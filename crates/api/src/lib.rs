//! HTTP API layer for grantdesk.
//!
//! - **Endpoints**: admin (bulk removal, audit, projects, invites),
//!   signup, enrollments and monthly reports
//! - **Extractors**: Authentication and caller context
//! - **Middleware**: Bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
