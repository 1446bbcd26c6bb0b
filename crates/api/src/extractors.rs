//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use grantdesk_core::AdminContext;
use grantdesk_db::entities::profile;

/// Authenticated profile extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub profile::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<profile::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Caller context of an authenticated request.
///
/// Role checks happen in the services; this only establishes who is calling.
#[derive(Debug, Clone)]
pub struct Caller(pub AdminContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(profile) = AuthUser::from_request_parts(parts, state).await?;
        Ok(Self(AdminContext::from_profile(&profile)))
    }
}
