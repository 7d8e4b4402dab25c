use axum::{extract::State, response::IntoResponse, Json};
use crate::api::dtos::responses::HealthResponse;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        message: "Tarot backend is running",
        timestamp: Utc::now(),
        text_provider: state.provider.status().await,
    })
}
