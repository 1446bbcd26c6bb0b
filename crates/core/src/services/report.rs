//! Monthly progress reports.

use chrono::NaiveDate;
use grantdesk_common::{AppError, AppResult, IdGenerator};
use grantdesk_db::{
    entities::report,
    repositories::{EnrollmentRepository, ReportRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::context::AdminContext;
use super::enrollment::first_of_month;

/// Input for submitting a monthly report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportInput {
    pub reference_month: NaiveDate,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    enrollment_repo: EnrollmentRepository,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, enrollment_repo: EnrollmentRepository) -> Self {
        Self {
            report_repo,
            enrollment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit the caller's report for a month.
    pub async fn submit(
        &self,
        ctx: &AdminContext,
        input: SubmitReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;
        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Report content is required".to_string()));
        }

        let enrollment = self
            .enrollment_repo
            .find_active_by_user(&ctx.actor_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(
                    "An active enrollment is required to submit reports".to_string(),
                )
            })?;

        let month = first_of_month(input.reference_month);
        if month < enrollment.start_month || month > enrollment.end_month {
            return Err(AppError::BadRequest(
                "Month is outside the enrollment period".to_string(),
            ));
        }

        if self
            .report_repo
            .find_by_user_and_month(&ctx.actor_id, month)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A report for this month was already submitted".to_string(),
            ));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(ctx.actor_id.clone()),
            enrollment_id: Set(enrollment.id),
            reference_month: Set(month),
            content: Set(content.to_string()),
            submitted_at: Set(chrono::Utc::now().into()),
        };

        self.report_repo.create(model).await
    }

    /// Reports of a scholar. Scholars see their own; staff see anyone's.
    pub async fn list_for_user(
        &self,
        ctx: &AdminContext,
        user_id: &str,
    ) -> AppResult<Vec<report::Model>> {
        if user_id != ctx.actor_id {
            ctx.require_staff()?;
        }
        self.report_repo.find_by_user(user_id).await
    }
}
