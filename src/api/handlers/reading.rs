use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{required_text, ReadingRequest},
    responses::{DrawResponse, InterpretationResponse},
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

fn context(raw: Option<String>) -> Option<String> {
    raw.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

pub async fn create_reading(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReadingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = required_text(payload.user_id, "user")?;
    let spread_id = required_text(payload.spread_id, "spread")?;
    let interpretation_id = payload.interpretation_id.filter(|id| !id.trim().is_empty());

    let outcome = state.reading_service
        .perform_reading(&user_id, &spread_id, context(payload.user_context), interpretation_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(InterpretationResponse::from(outcome))))
}

pub async fn draw_cards(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReadingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = required_text(payload.user_id, "user")?;
    let spread_id = required_text(payload.spread_id, "spread")?;

    let outcome = state.reading_service
        .draw_cards(&user_id, &spread_id, context(payload.user_context))
        .await?;

    Ok(Json(DrawResponse::from(outcome)))
}

pub async fn create_interpretation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReadingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = required_text(payload.user_id, "user")?;
    let spread_id = required_text(payload.spread_id, "spread")?;
    let interpretation_id = required_text(payload.interpretation_id, "interpretation_id")?;

    let outcome = state.reading_service
        .complete_reading(&interpretation_id, &user_id, &spread_id, context(payload.user_context))
        .await?;

    Ok((StatusCode::CREATED, Json(InterpretationResponse::from(outcome))))
}
