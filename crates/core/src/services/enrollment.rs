//! Enrollment of scholars into sub-projects and their installments.

use chrono::{Datelike, Months, NaiveDate};
use grantdesk_common::{AppError, AppResult, IdGenerator};
use grantdesk_db::{
    entities::{
        enrollment::{self, EnrollmentStatus},
        payment::{self, PaymentStatus},
    },
    repositories::{EnrollmentRepository, PaymentRepository, ProfileRepository, ProjectRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use super::context::AdminContext;

/// Name of the partial unique index allowing one active enrollment per scholar.
const ONE_ACTIVE_INDEX: &str = "idx_enrollment_one_active";

/// Longest enrollment accepted, in monthly installments.
pub const MAX_INSTALLMENTS: i32 = 120;

/// Input for enrolling a scholar.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollInput {
    pub user_id: String,
    pub sub_project_id: String,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
}

/// First day of the month containing `date`.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of monthly installments between two months, both included.
#[must_use]
pub fn installment_count(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) + 1
}

/// Enrollment service.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollment_repo: EnrollmentRepository,
    payment_repo: PaymentRepository,
    profile_repo: ProfileRepository,
    project_repo: ProjectRepository,
    id_gen: IdGenerator,
}

impl EnrollmentService {
    /// Create a new enrollment service.
    #[must_use]
    pub const fn new(
        enrollment_repo: EnrollmentRepository,
        payment_repo: PaymentRepository,
        profile_repo: ProfileRepository,
        project_repo: ProjectRepository,
    ) -> Self {
        Self {
            enrollment_repo,
            payment_repo,
            profile_repo,
            project_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Enroll a scholar and schedule one pending payment per month.
    ///
    /// A scholar holds at most one active enrollment at a time.
    pub async fn enroll(
        &self,
        ctx: &AdminContext,
        input: EnrollInput,
    ) -> AppResult<enrollment::Model> {
        ctx.require_staff()?;

        let start = first_of_month(input.start_month);
        let end = first_of_month(input.end_month);
        if end < start {
            return Err(AppError::Validation(
                "End month must not precede start month".to_string(),
            ));
        }
        let count = installment_count(start, end);
        if count > MAX_INSTALLMENTS {
            return Err(AppError::Validation(format!(
                "Enrollment may not exceed {MAX_INSTALLMENTS} months"
            )));
        }

        let scholar = self.profile_repo.get_by_id(&input.user_id).await?;
        if !scholar.is_active {
            return Err(AppError::BadRequest(
                "Cannot enroll a deactivated user".to_string(),
            ));
        }

        let sub_project = self
            .project_repo
            .find_sub_project(&input.sub_project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sub-project not found".to_string()))?;

        if self
            .enrollment_repo
            .find_active_by_user(&scholar.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Scholar already has an active enrollment".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let enrollment_id = self.id_gen.generate();
        let installments = (0..count)
            .map(|n| {
                let month = start
                    .checked_add_months(Months::new(n.unsigned_abs()))
                    .ok_or_else(|| AppError::Validation("Month out of range".to_string()))?;
                Ok(payment::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    enrollment_id: Set(enrollment_id.clone()),
                    user_id: Set(scholar.id.clone()),
                    installment_number: Set(n + 1),
                    reference_month: Set(month),
                    amount_cents: Set(sub_project.monthly_amount_cents),
                    status: Set(PaymentStatus::Pending),
                    paid_at: Set(None),
                    created_at: Set(now.into()),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let model = enrollment::ActiveModel {
            id: Set(enrollment_id),
            user_id: Set(scholar.id.clone()),
            sub_project_id: Set(sub_project.id.clone()),
            status: Set(EnrollmentStatus::Active),
            start_month: Set(start),
            end_month: Set(end),
            monthly_amount_cents: Set(sub_project.monthly_amount_cents),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let enrollment = self
            .enrollment_repo
            .create_with_installments(model, installments)
            .await
            .map_err(|e| match e {
                AppError::Database(msg) if msg.contains(ONE_ACTIVE_INDEX) => AppError::Conflict(
                    "Scholar already has an active enrollment".to_string(),
                ),
                other => other,
            })?;

        tracing::info!(
            enrollment_id = %enrollment.id,
            user_id = %enrollment.user_id,
            installments = count,
            "Enrolled scholar"
        );

        Ok(enrollment)
    }

    /// Installments of an enrollment, in order.
    pub async fn installments(
        &self,
        ctx: &AdminContext,
        enrollment_id: &str,
    ) -> AppResult<Vec<payment::Model>> {
        let enrollment = self
            .enrollment_repo
            .find_by_id(enrollment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

        if enrollment.user_id != ctx.actor_id {
            ctx.require_staff()?;
        }

        self.payment_repo.find_by_enrollment(enrollment_id).await
    }

    /// Mark an installment as paid. Paying twice is a no-op.
    pub async fn mark_payment_paid(
        &self,
        ctx: &AdminContext,
        payment_id: &str,
    ) -> AppResult<payment::Model> {
        ctx.require_staff()?;

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        match payment.status {
            PaymentStatus::Paid => Ok(payment),
            PaymentStatus::Cancelled => Err(AppError::BadRequest(
                "Cannot pay a cancelled installment".to_string(),
            )),
            PaymentStatus::Pending => {
                let mut active: payment::ActiveModel = payment.into();
                active.status = Set(PaymentStatus::Paid);
                active.paid_at = Set(Some(chrono::Utc::now().into()));
                self.payment_repo.update(active).await
            }
        }
    }
}
