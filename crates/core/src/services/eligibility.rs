//! Hard-deletion eligibility of scholars.
//!
//! A user may be hard-deleted only when no enrollment, payment or report
//! references them. Eligibility is computed on demand and never stored.

use std::collections::{HashMap, HashSet};

use grantdesk_common::{AppError, AppResult};
use grantdesk_db::repositories::{
    EnrollmentRepository, PaymentRepository, ProfileRepository, ReportRepository,
};
use serde::{Deserialize, Serialize};

use super::selection::Selection;

/// Kind of linked record that blocks deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Enrollment,
    Payment,
    Report,
}

/// Eligibility of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEligibility {
    pub user_id: String,
    /// Display name, or the id when the profile no longer exists.
    pub name: String,
    pub email: Option<String>,
    pub has_enrollment: bool,
    pub has_payment: bool,
    pub has_report: bool,
    pub reasons: Vec<DependencyKind>,
    pub can_delete: bool,
}

/// Eligibility of a whole selection, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    users: Vec<UserEligibility>,
}

impl EligibilityReport {
    #[must_use]
    pub const fn new(users: Vec<UserEligibility>) -> Self {
        Self { users }
    }

    #[must_use]
    pub fn users(&self) -> &[UserEligibility] {
        &self.users
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users with no linked records.
    pub fn eligible_for_deletion(&self) -> impl Iterator<Item = &UserEligibility> {
        self.users.iter().filter(|u| u.can_delete)
    }

    /// Users with at least one linked record.
    pub fn ineligible_for_deletion(&self) -> impl Iterator<Item = &UserEligibility> {
        self.users.iter().filter(|u| !u.can_delete)
    }
}

/// Eligibility checker.
#[derive(Clone)]
pub struct EligibilityService {
    profile_repo: ProfileRepository,
    enrollment_repo: EnrollmentRepository,
    payment_repo: PaymentRepository,
    report_repo: ReportRepository,
}

impl EligibilityService {
    /// Create a new eligibility service.
    #[must_use]
    pub const fn new(
        profile_repo: ProfileRepository,
        enrollment_repo: EnrollmentRepository,
        payment_repo: PaymentRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self {
            profile_repo,
            enrollment_repo,
            payment_repo,
            report_repo,
        }
    }

    /// Classify every selected user.
    ///
    /// Any failing query aborts the whole check with
    /// [`AppError::EligibilityCheck`]; no partial report is returned.
    pub async fn check(&self, selection: &Selection) -> AppResult<EligibilityReport> {
        if selection.is_empty() {
            return Err(AppError::Validation(
                "At least one user must be selected".to_string(),
            ));
        }

        self.classify(selection.as_slice()).await.map_err(|e| {
            tracing::error!(error = %e, users = selection.len(), "Eligibility check failed");
            AppError::EligibilityCheck
        })
    }

    async fn classify(&self, ids: &[String]) -> AppResult<EligibilityReport> {
        let profiles: HashMap<String, _> = self
            .profile_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let enrolled: HashSet<String> = self
            .enrollment_repo
            .find_user_ids_with_enrollments(ids)
            .await?
            .into_iter()
            .collect();
        let paid: HashSet<String> = self
            .payment_repo
            .find_user_ids_with_payments(ids)
            .await?
            .into_iter()
            .collect();
        let reported: HashSet<String> = self
            .report_repo
            .find_user_ids_with_reports(ids)
            .await?
            .into_iter()
            .collect();

        let users = ids
            .iter()
            .map(|id| {
                let has_enrollment = enrolled.contains(id);
                let has_payment = paid.contains(id);
                let has_report = reported.contains(id);

                let reasons = [
                    (has_enrollment, DependencyKind::Enrollment),
                    (has_payment, DependencyKind::Payment),
                    (has_report, DependencyKind::Report),
                ]
                .into_iter()
                .filter_map(|(present, kind)| present.then_some(kind))
                .collect::<Vec<_>>();

                let profile = profiles.get(id);
                UserEligibility {
                    user_id: id.clone(),
                    name: profile.map_or_else(|| id.clone(), |p| p.name.clone()),
                    email: profile.map(|p| p.email.clone()),
                    has_enrollment,
                    has_payment,
                    has_report,
                    can_delete: reasons.is_empty(),
                    reasons,
                }
            })
            .collect();

        Ok(EligibilityReport::new(users))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grantdesk_db::entities::profile::{self, Role};
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn create_test_profile(id: &str, name: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            cpf: "52998224725".to_string(),
            role: Role::Scholar,
            is_active: true,
            api_token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn user_id_rows(ids: &[&str]) -> Vec<BTreeMap<&'static str, Value>> {
        ids.iter()
            .map(|id| maplit::btreemap! { "user_id" => Value::from(*id) })
            .collect()
    }

    fn service(db: DatabaseConnection) -> EligibilityService {
        let db = Arc::new(db);
        EligibilityService::new(
            ProfileRepository::new(Arc::clone(&db)),
            EnrollmentRepository::new(Arc::clone(&db)),
            PaymentRepository::new(Arc::clone(&db)),
            ReportRepository::new(db),
        )
    }

    fn mock(
        profiles: Vec<profile::Model>,
        enrolled: &[&str],
        paid: &[&str],
        reported: &[&str],
    ) -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([profiles])
            .append_query_results([user_id_rows(enrolled)])
            .append_query_results([user_id_rows(paid)])
            .append_query_results([user_id_rows(reported)])
            .into_connection()
    }

    #[tokio::test]
    async fn test_classification_follows_dependencies() {
        let db = mock(
            vec![
                create_test_profile("u1", "Ana"),
                create_test_profile("u2", "Bruno"),
                create_test_profile("u3", "Carla"),
            ],
            &["u2"],
            &["u2", "u3"],
            &[],
        );

        let report = service(db)
            .check(&Selection::from_ids(["u1", "u2", "u3"]))
            .await
            .unwrap();

        let users = report.users();
        assert_eq!(users.len(), 3);
        assert!(users[0].can_delete);
        assert!(users[0].reasons.is_empty());
        assert!(!users[1].can_delete);
        assert_eq!(
            users[1].reasons,
            vec![DependencyKind::Enrollment, DependencyKind::Payment]
        );
        assert_eq!(users[2].reasons, vec![DependencyKind::Payment]);

        let eligible: Vec<_> = report.eligible_for_deletion().map(|u| u.name.as_str()).collect();
        let ineligible: Vec<_> = report
            .ineligible_for_deletion()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(eligible, vec!["Ana"]);
        assert_eq!(ineligible, vec!["Bruno", "Carla"]);
    }

    #[tokio::test]
    async fn test_output_keeps_selection_order() {
        // Profiles come back in storage order, not selection order
        let db = mock(
            vec![create_test_profile("a", "First"), create_test_profile("b", "Second")],
            &[],
            &[],
            &[],
        );

        let report = service(db)
            .check(&Selection::from_ids(["b", "a"]))
            .await
            .unwrap();

        let ids: Vec<_> = report.users().iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_missing_profile_falls_back_to_id() {
        let db = mock(vec![], &[], &[], &[]);

        let report = service(db)
            .check(&Selection::from_ids(["ghost"]))
            .await
            .unwrap();

        assert_eq!(report.users()[0].name, "ghost");
        assert_eq!(report.users()[0].email, None);
        assert!(report.users()[0].can_delete);
    }

    #[tokio::test]
    async fn test_query_failure_is_generic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![create_test_profile("u1", "Ana")]])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();

        let err = service(db)
            .check(&Selection::from_ids(["u1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EligibilityCheck));
    }

    #[tokio::test]
    async fn test_empty_selection_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = service(db).check(&Selection::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_check_is_idempotent() {
        let profiles = vec![create_test_profile("u1", "Ana"), create_test_profile("u2", "Bruno")];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([profiles.clone()])
            .append_query_results([user_id_rows(&["u2"])])
            .append_query_results([user_id_rows(&[])])
            .append_query_results([user_id_rows(&[])])
            .append_query_results([profiles])
            .append_query_results([user_id_rows(&["u2"])])
            .append_query_results([user_id_rows(&[])])
            .append_query_results([user_id_rows(&[])])
            .into_connection();
        let svc = service(db);
        let selection = Selection::from_ids(["u1", "u2"]);

        let first = svc.check(&selection).await.unwrap();
        let second = svc.check(&selection).await.unwrap();

        assert_eq!(first, second);
    }
}
