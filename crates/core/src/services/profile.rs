//! Profile lookup and token authentication.

use grantdesk_common::{AppError, AppResult};
use grantdesk_db::{entities::profile, repositories::ProfileRepository};

use super::context::AdminContext;

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }

    /// Authenticate by API token. Deactivated accounts are refused.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<profile::Model> {
        self.profile_repo
            .find_by_token(token)
            .await?
            .filter(|p| p.is_active)
            .ok_or(AppError::Unauthorized)
    }

    /// Get a profile. Users may read their own; staff may read anyone's.
    pub async fn get(&self, ctx: &AdminContext, id: &str) -> AppResult<profile::Model> {
        if id != ctx.actor_id {
            ctx.require_staff()?;
        }
        self.profile_repo.get_by_id(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grantdesk_db::entities::profile::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_profile(is_active: bool) -> profile::Model {
        profile::Model {
            id: "s1".to_string(),
            name: "Sofia".to_string(),
            email: "s1@example.com".to_string(),
            cpf: "52998224725".to_string(),
            role: Role::Scholar,
            is_active,
            api_token: Some("token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile(true)]])
                .into_connection(),
        );

        let service = ProfileService::new(ProfileRepository::new(db));
        let profile = service.authenticate_by_token("token").await.unwrap();
        assert_eq!(profile.id, "s1");
    }

    #[tokio::test]
    async fn test_deactivated_profile_cannot_authenticate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile(false)]])
                .into_connection(),
        );

        let service = ProfileService::new(ProfileRepository::new(db));
        let err = service.authenticate_by_token("token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_scholar_cannot_read_others() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ProfileService::new(ProfileRepository::new(db));
        let ctx = AdminContext::new("s1", "Sofia", Role::Scholar);

        let err = service.get(&ctx, "s2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
