use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Inactive,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(ProjectStatus::Active),
            "inactive" => Ok(ProjectStatus::Inactive),
            other => Err(AppError::Validation(format!("Unknown project status '{}'", other))),
        }
    }
}

/// Theme settings for the bot's web front. Every field has a default so a partial or
/// empty stored blob still deserializes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProjectDesign {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub button_color: String,
    pub button_text_color: String,
    pub welcome_message: Option<String>,
}

impl Default for ProjectDesign {
    fn default() -> Self {
        Self {
            primary_color: "#6c5ce7".to_string(),
            background_color: "#1e1b2e".to_string(),
            text_color: "#f5f3ff".to_string(),
            button_color: "#a29bfe".to_string(),
            button_text_color: "#ffffff".to_string(),
            welcome_message: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub telegram_token: String,
    pub design: Json<ProjectDesign>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, telegram_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            telegram_token,
            design: Json(ProjectDesign::default()),
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Public part of the bot token (the numeric bot id before the colon). Empty when the
    /// stored token has no colon, so a malformed token is never echoed back.
    pub fn bot_identity(&self) -> String {
        self.telegram_token
            .split_once(':')
            .map(|(bot_id, _)| bot_id.to_string())
            .unwrap_or_default()
    }
}

/// Checks the `<bot id>:<secret>` shape of a Telegram bot token.
pub fn validate_telegram_token(token: &str) -> Result<(), AppError> {
    match token.split_once(':') {
        Some((bot_id, secret))
            if !bot_id.is_empty() && bot_id.chars().all(|c| c.is_ascii_digit()) && !secret.is_empty() => Ok(()),
        _ => Err(AppError::Validation("telegram_token must look like <bot id>:<secret>".into())),
    }
}
