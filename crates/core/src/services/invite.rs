//! Invite codes and invite-gated scholar signup.

use std::sync::Arc;

use grantdesk_common::{AppError, AppResult, Cpf, IdGenerator};
use grantdesk_db::{
    entities::{
        invite_code,
        profile::{self, Role},
    },
    repositories::{InviteCodeRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::audit::{self, AuditEntry, AuditSink};
use super::context::AdminContext;

/// Unique indexes a concurrent signup can trip over.
const UNIQUE_PROFILE_INDEXES: [&str; 2] = ["idx_profile_email", "idx_profile_cpf"];

fn is_duplicate_profile(message: &str) -> bool {
    UNIQUE_PROFILE_INDEXES.iter().any(|index| message.contains(index))
}

/// Attempts at drawing an unused invite code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Input for creating an invite code.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteInput {
    #[serde(default = "default_max_uses")]
    #[validate(range(min = 1, max = 1000))]
    pub max_uses: i32,
    #[validate(range(min = 1, max = 365))]
    pub expires_in_days: Option<i64>,
}

const fn default_max_uses() -> i32 {
    1
}

/// Input for scholar signup.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub cpf: String,
    #[validate(length(min = 1, max = 32))]
    pub invite_code: String,
}

/// Invite service.
#[derive(Clone)]
pub struct InviteService {
    invite_repo: InviteCodeRepository,
    profile_repo: ProfileRepository,
    audit: Arc<dyn AuditSink>,
    id_gen: IdGenerator,
}

impl InviteService {
    /// Create a new invite service.
    #[must_use]
    pub fn new(
        invite_repo: InviteCodeRepository,
        profile_repo: ProfileRepository,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            invite_repo,
            profile_repo,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an invite code. Admins and managers only.
    pub async fn create_invite(
        &self,
        ctx: &AdminContext,
        input: CreateInviteInput,
    ) -> AppResult<invite_code::Model> {
        ctx.require_staff()?;
        input.validate()?;

        let mut code = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = self.id_gen.generate_invite_code();
            if self.invite_repo.find_by_code(&candidate).await?.is_none() {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or_else(|| {
            AppError::Internal("Could not generate a unique invite code".to_string())
        })?;

        let now = chrono::Utc::now();
        let model = invite_code::ActiveModel {
            id: Set(self.id_gen.generate()),
            code: Set(code),
            max_uses: Set(input.max_uses),
            uses: Set(0),
            expires_at: Set(input
                .expires_in_days
                .map(|days| (now + chrono::Duration::days(days)).into())),
            created_by: Set(ctx.actor_id.clone()),
            created_at: Set(now.into()),
        };

        let invite = self.invite_repo.create(model).await?;

        audit::emit(
            self.audit.as_ref(),
            ctx,
            AuditEntry::new(
                "create_invite_code",
                "invite_code",
                json!({
                    "invite_id": invite.id,
                    "max_uses": invite.max_uses,
                    "expires_at": invite.expires_at,
                }),
            ),
        )
        .await;

        Ok(invite)
    }

    /// Register a scholar with an invite code.
    pub async fn signup(&self, input: SignupInput) -> AppResult<profile::Model> {
        input.validate()?;
        let cpf = Cpf::parse(&input.cpf)?;
        let email = input.email.trim().to_lowercase();

        let code = input.invite_code.trim().to_uppercase();
        let invite = self
            .invite_repo
            .find_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;

        if invite
            .expires_at
            .is_some_and(|at| at < chrono::Utc::now().fixed_offset())
        {
            return Err(AppError::BadRequest("Invite code has expired".to_string()));
        }
        if invite.uses >= invite.max_uses {
            return Err(AppError::BadRequest("Invite code is exhausted".to_string()));
        }

        if self
            .profile_repo
            .find_by_email_or_cpf(&email, cpf.digits())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "An account with this email or CPF already exists".to_string(),
            ));
        }

        let model = profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            cpf: Set(cpf.digits().to_string()),
            role: Set(Role::Scholar),
            is_active: Set(true),
            api_token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let profile = self
            .invite_repo
            .redeem(&invite.id, model)
            .await
            .map_err(|e| match e {
                AppError::Database(msg) if is_duplicate_profile(&msg) => AppError::Conflict(
                    "An account with this email or CPF already exists".to_string(),
                ),
                other => other,
            })?
            // Lost race against another signup for the last use
            .ok_or_else(|| AppError::BadRequest("Invite code is exhausted".to_string()))?;

        tracing::info!(user_id = %profile.id, invite_id = %invite.id, "Scholar signed up");
        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::audit::AuditService;
    use chrono::Utc;
    use grantdesk_db::repositories::AuditLogRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> InviteService {
        shared_service(&Arc::new(db))
    }

    fn shared_service(db: &Arc<DatabaseConnection>) -> InviteService {
        let db = Arc::clone(db);
        InviteService::new(
            InviteCodeRepository::new(Arc::clone(&db)),
            ProfileRepository::new(Arc::clone(&db)),
            Arc::new(AuditService::new(AuditLogRepository::new(db))),
        )
    }

    fn create_test_invite(uses: i32, max_uses: i32) -> invite_code::Model {
        invite_code::Model {
            id: "inv1".to_string(),
            code: "ABCD2345".to_string(),
            max_uses,
            uses,
            expires_at: None,
            created_by: "admin1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn signup_input(cpf: &str) -> SignupInput {
        SignupInput {
            name: "Sofia Lima".to_string(),
            email: "Sofia@Example.com".to_string(),
            cpf: cpf.to_string(),
            invite_code: "abcd2345".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_scholar() {
        let created = profile::Model {
            id: "p1".to_string(),
            name: "Sofia Lima".to_string(),
            email: "sofia@example.com".to_string(),
            cpf: "52998224725".to_string(),
            role: Role::Scholar,
            is_active: true,
            api_token: Some("tok".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_invite(0, 1)]])
            .append_query_results([Vec::<profile::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[created]])
            .into_connection();

        let profile = service(db)
            .signup(signup_input("529.982.247-25"))
            .await
            .unwrap();

        assert_eq!(profile.role, Role::Scholar);
        assert!(profile.api_token.is_some());
    }

    #[tokio::test]
    async fn test_signup_duplicate_insert_keeps_invite_use() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_invite(0, 1)]])
                .append_query_results([Vec::<profile::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_errors([DbErr::Custom(
                    "duplicate key value violates unique constraint \"idx_profile_email\""
                        .to_string(),
                )])
                .into_connection(),
        );

        let err = shared_service(&db)
            .signup(signup_input("529.982.247-25"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(log.iter().all(|t| !format!("{t:?}").contains("UPDATE")));
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_cpf() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = service(db)
            .signup(signup_input("529.982.247-00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_signup_rejects_exhausted_invite() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_invite(3, 3)]])
            .into_connection();

        let err = service(db)
            .signup(signup_input("52998224725"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_signup_unknown_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<invite_code::Model>::new()])
            .into_connection();

        let err = service(db)
            .signup(signup_input("52998224725"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_invite_forbidden_for_scholar() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let scholar = AdminContext::new("s1", "Sofia", Role::Scholar);

        let err = service(db)
            .create_invite(
                &scholar,
                CreateInviteInput {
                    max_uses: 1,
                    expires_in_days: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
