use axum::{extract::State, response::IntoResponse, Json};
use crate::api::dtos::requests::{required, required_text, BotMessageDto, BotWebhookRequest};
use crate::api::extractors::project::ProjectPath;
use crate::domain::services::bot::BotMessage;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BotWebhookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project_id = required_text(payload.project_id, "project_id")?;
    let message = required(payload.message, "message")?;

    let reply = state.bot.handle(&project_id, bot_message(message)).await?;
    Ok(Json(reply))
}

/// Same dispatch as the webhook, addressed by the project in the path.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    ProjectPath(project): ProjectPath,
    Json(message): Json<BotMessageDto>,
) -> Result<impl IntoResponse, AppError> {
    let reply = state.bot.handle(&project.id, bot_message(message)).await?;
    Ok(Json(reply))
}

pub async fn active_bots(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bot.active_bots().await?))
}

fn bot_message(message: BotMessageDto) -> BotMessage {
    // A command may arrive in `text` when the client does not split it out.
    let command = message.command.or_else(|| message.text.filter(|t| t.trim_start().starts_with('/')));
    BotMessage {
        kind: message.kind.unwrap_or_else(|| "text".to_string()),
        command,
        user_id: message.user_id,
        username: message.username,
    }
}
