use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{required, required_text, CreateUserRequest, GrantReadingsRequest},
    responses::UserResponse,
};
use crate::domain::models::user::User;
use crate::domain::services::ledger::is_subscription_active;
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;

fn user_response(user: User) -> UserResponse {
    let subscription_active = is_subscription_active(&user, Utc::now().date_naive());
    UserResponse { user, subscription_active }
}

/// Registers a platform user with a project, or returns the existing record unchanged.
pub async fn get_or_create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project_id = required_text(payload.project, "project")?;
    let telegram_user_id = required(payload.telegram_user_id, "telegram_user_id")?;
    let balance = payload.balance.unwrap_or(state.config.default_user_balance);
    if balance < 0 {
        return Err(AppError::Validation("Balance cannot be negative".into()));
    }

    state.project_repo.find_by_id(&project_id).await?
        .ok_or(AppError::NotFound("Project not found".into()))?;

    let user = state.user_repo
        .get_or_create(&User::new(project_id, telegram_user_id, payload.username, balance))
        .await?;

    Ok(Json(user_response(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(user_response(user)))
}

pub async fn grant_readings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<GrantReadingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let readings = required(payload.readings, "readings")?;
    let user = state.ledger.credit_one_time(&user_id, readings).await?;
    Ok(Json(user_response(user)))
}

pub async fn list_interpretations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(state.interpretation_repo.list_by_user(&user_id).await?))
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(state.payment_repo.list_by_user(&user_id).await?))
}
