//! Enrollment and installment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use grantdesk_common::AppResult;
use grantdesk_core::EnrollInput;
use grantdesk_db::entities::{
    enrollment::{self, EnrollmentStatus},
    payment::{self, PaymentStatus},
};
use serde::{Deserialize, Serialize};

use crate::{extractors::Caller, middleware::AppState, response::ApiResponse};

/// Enrollment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: String,
    pub user_id: String,
    pub sub_project_id: String,
    pub status: EnrollmentStatus,
    pub start_month: String,
    pub end_month: String,
    pub monthly_amount_cents: i64,
    pub created_at: String,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(e: enrollment::Model) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            sub_project_id: e.sub_project_id,
            status: e.status,
            start_month: e.start_month.to_string(),
            end_month: e.end_month.to_string(),
            monthly_amount_cents: e.monthly_amount_cents,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// Installment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub enrollment_id: String,
    pub installment_number: i32,
    pub reference_month: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<String>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(p: payment::Model) -> Self {
        Self {
            id: p.id,
            enrollment_id: p.enrollment_id,
            installment_number: p.installment_number,
            reference_month: p.reference_month.to_string(),
            amount_cents: p.amount_cents,
            status: p.status,
            paid_at: p.paid_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentIdRequest {
    pub enrollment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIdRequest {
    pub payment_id: String,
}

async fn create_enrollment(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<EnrollInput>,
) -> AppResult<ApiResponse<EnrollmentResponse>> {
    let enrollment = state.enrollment_service.enroll(&ctx, req).await?;
    Ok(ApiResponse::ok(enrollment.into()))
}

async fn list_installments(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<EnrollmentIdRequest>,
) -> AppResult<ApiResponse<Vec<PaymentResponse>>> {
    let payments = state
        .enrollment_service
        .installments(&ctx, &req.enrollment_id)
        .await?;
    Ok(ApiResponse::ok(payments.into_iter().map(Into::into).collect()))
}

async fn mark_paid(
    Caller(ctx): Caller,
    State(state): State<AppState>,
    Json(req): Json<PaymentIdRequest>,
) -> AppResult<ApiResponse<PaymentResponse>> {
    let payment = state
        .enrollment_service
        .mark_payment_paid(&ctx, &req.payment_id)
        .await?;
    Ok(ApiResponse::ok(payment.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_enrollment))
        .route("/installments", post(list_installments))
        .route("/payments/mark-paid", post(mark_paid))
}
