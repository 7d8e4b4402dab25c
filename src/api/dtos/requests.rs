use crate::domain::models::project::ProjectDesign;
use crate::error::AppError;
use serde::Deserialize;

/// Fields are optional on the wire so a missing one becomes a JSON 400 from the handler.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Field '{}' is required", field)))
}

pub fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    required(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()), field)
}

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub telegram_token: Option<String>,
    pub design: Option<ProjectDesign>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    pub telegram_user_id: Option<i64>,
    pub username: Option<String>,
    pub balance: Option<i64>,
}

#[derive(Deserialize)]
pub struct GrantReadingsRequest {
    pub readings: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateDeckRequest {
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub meaning_upright: Option<String>,
    pub meaning_reversed: Option<String>,
    pub order: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateSpreadRequest {
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_cards: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreatePackageRequest {
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    pub name: Option<String>,
    pub package_type: Option<String>,
    pub price: Option<i64>,
    pub num_readings: Option<i64>,
    pub subscription_days: Option<i64>,
    pub is_active: Option<bool>,
}

/// Shared by the atomic and two-phase reading endpoints. Both `user_id` and `user` are
/// accepted, likewise for the spread.
#[derive(Deserialize)]
pub struct ReadingRequest {
    #[serde(alias = "user")]
    pub user_id: Option<String>,
    #[serde(alias = "spread")]
    pub spread_id: Option<String>,
    pub user_context: Option<String>,
    pub interpretation_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(alias = "user_id")]
    pub user: Option<String>,
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    #[serde(alias = "package_id")]
    pub package: Option<String>,
}

#[derive(Deserialize)]
pub struct TestPaymentRequest {
    #[serde(alias = "user_id")]
    pub user: Option<String>,
    #[serde(alias = "project_id")]
    pub project: Option<String>,
    #[serde(alias = "package_id")]
    pub package: Option<String>,
    pub pin_code: Option<String>,
}

#[derive(Deserialize)]
pub struct BotWebhookRequest {
    pub project_id: Option<String>,
    pub message: Option<BotMessageDto>,
}

#[derive(Deserialize)]
pub struct BotMessageDto {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub command: Option<String>,
    pub text: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}
