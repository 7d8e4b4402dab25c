use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{required_text, CreatePaymentRequest, TestPaymentRequest},
    responses::TestPaymentResponse,
};
use crate::domain::models::payment::{Payment, SettlementOutcome};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = required_text(payload.user, "user")?;
    let project_id = required_text(payload.project, "project")?;
    let package_id = required_text(payload.package, "package")?;

    let payment = state.settlement_service.create_payment(&user_id, &project_id, &package_id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.payment_repo.find_by_id(&payment_id).await?
        .ok_or(AppError::NotFound("Payment not found".into()))?;
    Ok(Json(payment))
}

async fn settle(state: &AppState, payment_id: &str, outcome: SettlementOutcome) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.settlement_service.settle(payment_id, outcome).await?))
}

pub async fn complete_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    settle(&state, &payment_id, SettlementOutcome::Completed).await
}

pub async fn fail_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    settle(&state, &payment_id, SettlementOutcome::Failed).await
}

pub async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    settle(&state, &payment_id, SettlementOutcome::Cancelled).await
}

pub async fn test_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TestPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = required_text(payload.user, "user")?;
    let project_id = required_text(payload.project, "project")?;
    let package_id = required_text(payload.package, "package")?;
    let pin_code = payload.pin_code.unwrap_or_default();

    let outcome = state.settlement_service
        .test_payment(&user_id, &project_id, &package_id, pin_code.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(TestPaymentResponse {
        success: true,
        message: "Test payment completed successfully!".to_string(),
        new_balance: outcome.user.balance,
        subscription_end: outcome.user.subscription_end,
        payment: outcome.payment,
    })))
}
