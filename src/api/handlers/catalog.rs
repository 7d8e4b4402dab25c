use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{required, required_text, CreateCardRequest, CreateDeckRequest, CreateSpreadRequest};
use crate::domain::models::{
    deck::{Card, Deck, NewCardParams},
    spread::Spread,
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn create_deck(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project_id = required_text(payload.project, "project")?;
    let name = required_text(payload.name, "name")?;

    state.project_repo.find_by_id(&project_id).await?
        .ok_or(AppError::NotFound("Project not found".into()))?;

    let deck = state.deck_repo
        .create(&Deck::new(project_id, name, payload.description.unwrap_or_default()))
        .await?;
    info!("Deck {} created for project {}", deck.id, deck.project_id);

    Ok((StatusCode::CREATED, Json(deck)))
}

pub async fn add_card(
    State(state): State<Arc<AppState>>,
    Path(deck_id): Path<String>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let deck = state.deck_repo.find_by_id(&deck_id).await?
        .ok_or(AppError::NotFound("Deck not found".into()))?;

    let sort_order = payload.order.unwrap_or(0);
    if sort_order < 0 {
        return Err(AppError::Validation("Card order cannot be negative".into()));
    }

    let card = Card::new(NewCardParams {
        deck_id: deck.id,
        name: required_text(payload.name, "name")?,
        image_url: payload.image_url.filter(|u| !u.trim().is_empty()),
        meaning_upright: required_text(payload.meaning_upright, "meaning_upright")?,
        meaning_reversed: required_text(payload.meaning_reversed, "meaning_reversed")?,
        sort_order,
    });

    Ok((StatusCode::CREATED, Json(state.deck_repo.add_card(&card).await?)))
}

pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path(deck_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.deck_repo.find_by_id(&deck_id).await?
        .ok_or(AppError::NotFound("Deck not found".into()))?;
    Ok(Json(state.deck_repo.list_cards(&deck_id).await?))
}

pub async fn create_spread(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSpreadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project_id = required_text(payload.project, "project")?;
    let name = required_text(payload.name, "name")?;
    let num_cards = required(payload.num_cards, "num_cards")?;
    if num_cards < 1 {
        return Err(AppError::Validation("num_cards must be at least 1".into()));
    }

    state.project_repo.find_by_id(&project_id).await?
        .ok_or(AppError::NotFound("Project not found".into()))?;

    let spread = state.spread_repo
        .create(&Spread::new(project_id, name, payload.description.unwrap_or_default(), num_cards))
        .await?;

    Ok((StatusCode::CREATED, Json(spread)))
}
