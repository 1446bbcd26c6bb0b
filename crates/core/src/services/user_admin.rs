//! Privileged user administration.
//!
//! Deleting, deactivating and reactivating accounts goes through
//! [`UserAdminGateway`]. The workflow layer only sees the typed
//! [`ActionResults`] / [`GatewayError`] contract, whichever implementation
//! is wired in.

use async_trait::async_trait;
use grantdesk_db::repositories::{DeleteOutcome, ProfileDependencies, ProfileRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Action requested from the user administration procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Delete,
    Deactivate,
    Reactivate,
}

impl UserAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Deactivate => "deactivate",
            Self::Reactivate => "reactivate",
        }
    }
}

/// A user the procedure could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUser {
    pub id: String,
    pub error: String,
}

/// Per-user outcome of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResults {
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub failed: Vec<FailedUser>,
}

/// A call that failed as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The procedure could not be reached or answered with something unreadable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The procedure refused the request with a structured error.
    #[error("{error}")]
    Rejected {
        error: String,
        message: Option<String>,
        details: Option<Value>,
    },
}

impl GatewayError {
    /// Message fit to show an operator verbatim, if the procedure sent one.
    #[must_use]
    pub fn operator_message(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Rejected { error, message, .. } => Some(message.as_deref().unwrap_or(error)),
        }
    }
}

/// Privileged procedure that mutates user accounts.
///
/// Implementations never retry; each call is one attempt.
#[async_trait]
pub trait UserAdminGateway: Send + Sync {
    async fn execute(
        &self,
        action: UserAction,
        user_ids: &[String],
    ) -> Result<ActionResults, GatewayError>;
}

/// In-process implementation running directly against the database.
#[derive(Clone)]
pub struct DbUserAdmin {
    profile_repo: ProfileRepository,
}

impl DbUserAdmin {
    /// Create a new in-process user administration procedure.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }

    async fn apply(&self, action: UserAction, id: &str) -> Result<(), String> {
        let outcome = match action {
            // Dependencies are counted again inside the delete transaction
            UserAction::Delete => match self.profile_repo.delete_if_unreferenced(id).await {
                Ok(DeleteOutcome::Deleted) => return Ok(()),
                Ok(DeleteOutcome::NotFound) => return Err(USER_NOT_FOUND.to_string()),
                Ok(DeleteOutcome::HasDependencies(deps)) => {
                    return Err(format!("still has dependencies ({})", describe(deps)));
                }
                Err(e) => Err(e),
            },
            UserAction::Deactivate => self.profile_repo.deactivate(id).await,
            UserAction::Reactivate => self.profile_repo.reactivate(id).await,
        };

        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(USER_NOT_FOUND.to_string()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %id,
                    action = action.as_str(),
                    "User administration failed"
                );
                Err(e.to_string())
            }
        }
    }
}

const USER_NOT_FOUND: &str = "user not found";

fn describe(deps: ProfileDependencies) -> String {
    [
        (deps.enrollments, "enrollment"),
        (deps.payments, "payment"),
        (deps.reports, "report"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, kind)| format!("{n} {kind}{}", if n == 1 { "" } else { "s" }))
    .collect::<Vec<_>>()
    .join(", ")
}

#[async_trait]
impl UserAdminGateway for DbUserAdmin {
    async fn execute(
        &self,
        action: UserAction,
        user_ids: &[String],
    ) -> Result<ActionResults, GatewayError> {
        if user_ids.is_empty() {
            return Err(GatewayError::Rejected {
                error: "invalid_request".to_string(),
                message: Some("userIds must not be empty".to_string()),
                details: None,
            });
        }

        let mut results = ActionResults::default();
        for id in user_ids {
            match self.apply(action, id).await {
                Ok(()) => results.success.push(id.clone()),
                Err(error) => results.failed.push(FailedUser {
                    id: id.clone(),
                    error,
                }),
            }
        }

        tracing::info!(
            action = action.as_str(),
            succeeded = results.success.len(),
            failed = results.failed.len(),
            "User administration call finished"
        );

        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grantdesk_db::entities::profile::{self, Role};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value as DbValue};
    use std::sync::Arc;

    fn create_test_profile(id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            name: "Ana".to_string(),
            email: format!("{id}@example.com"),
            cpf: "52998224725".to_string(),
            role: Role::Scholar,
            is_active: true,
            api_token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count(n: i64) -> Vec<std::collections::BTreeMap<&'static str, DbValue>> {
        vec![maplit::btreemap! { "num_items" => DbValue::BigInt(Some(n)) }]
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(serde_json::to_value(UserAction::Deactivate).unwrap(), "deactivate");
        assert_eq!(UserAction::Delete.as_str(), "delete");
    }

    #[test]
    fn test_operator_message() {
        let rejected = GatewayError::Rejected {
            error: "forbidden".to_string(),
            message: Some("still referenced".to_string()),
            details: None,
        };
        assert_eq!(rejected.operator_message(), Some("still referenced"));

        let bare = GatewayError::Rejected {
            error: "forbidden".to_string(),
            message: None,
            details: None,
        };
        assert_eq!(bare.operator_message(), Some("forbidden"));
        assert_eq!(GatewayError::Transport("reset".to_string()).operator_message(), None);
    }

    #[test]
    fn test_describe_dependencies() {
        let deps = ProfileDependencies {
            enrollments: 1,
            payments: 0,
            reports: 3,
        };
        assert_eq!(describe(deps), "1 enrollment, 3 reports");
    }

    #[tokio::test]
    async fn test_delete_reports_dependencies_per_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // u1: free, deleted
                .append_query_results([[create_test_profile("u1")]])
                .append_query_results([count(0)])
                .append_query_results([count(0)])
                .append_query_results([count(0)])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                // u2: gained a payment since the check
                .append_query_results([[create_test_profile("u2")]])
                .append_query_results([count(0)])
                .append_query_results([count(1)])
                .append_query_results([count(0)])
                // u3: gone
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let admin = DbUserAdmin::new(ProfileRepository::new(db));
        let ids = ["u1", "u2", "u3"].map(String::from);
        let results = admin.execute(UserAction::Delete, &ids).await.unwrap();

        assert_eq!(results.success, vec!["u1".to_string()]);
        assert_eq!(
            results.failed,
            vec![
                FailedUser {
                    id: "u2".to_string(),
                    error: "still has dependencies (1 payment)".to_string(),
                },
                FailedUser {
                    id: "u3".to_string(),
                    error: "user not found".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_reactivate_unknown_user_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let admin = DbUserAdmin::new(ProfileRepository::new(db));
        let results = admin
            .execute(UserAction::Reactivate, &["nobody".to_string()])
            .await
            .unwrap();

        assert!(results.success.is_empty());
        assert_eq!(results.failed[0].error, "user not found");
    }

    #[tokio::test]
    async fn test_empty_call_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let admin = DbUserAdmin::new(ProfileRepository::new(db));

        let err = admin.execute(UserAction::Delete, &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }
}
