use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use crate::domain::models::{deck::DrawnCard, payment::Payment, user::User};
use crate::domain::services::interpretation_provider::{ProviderStatus, TextSource};
use crate::domain::services::reading_service::{DrawOutcome, ReadingOutcome};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub text_provider: ProviderStatus,
}

#[derive(Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub subscription_active: bool,
}

#[derive(Serialize)]
pub struct CardUsed {
    pub name: String,
    pub is_reversed: bool,
}

impl From<&DrawnCard> for CardUsed {
    fn from(drawn: &DrawnCard) -> Self {
        Self { name: drawn.card.name.clone(), is_reversed: drawn.is_reversed() }
    }
}

fn card_names(cards: &[DrawnCard]) -> Vec<String> {
    cards.iter().map(|c| c.card.name.clone()).collect()
}

fn card_images(cards: &[DrawnCard]) -> Vec<String> {
    cards.iter().map(|c| c.card.image_url.clone().unwrap_or_default()).collect()
}

#[derive(Serialize)]
pub struct InterpretationResponse {
    pub id: String,
    pub user: String,
    pub user_username: Option<String>,
    pub spread: String,
    pub spread_name: String,
    pub cards: Vec<String>,
    pub cards_names: Vec<String>,
    pub cards_images: Vec<String>,
    pub ai_response: String,
    pub user_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub success: bool,
    pub cards_used: Vec<CardUsed>,
    pub ai_service_status: TextSource,
}

impl From<ReadingOutcome> for InterpretationResponse {
    fn from(outcome: ReadingOutcome) -> Self {
        Self {
            cards: outcome.cards.iter().map(|c| c.card.id.clone()).collect(),
            cards_names: card_names(&outcome.cards),
            cards_images: card_images(&outcome.cards),
            cards_used: outcome.cards.iter().map(CardUsed::from).collect(),
            id: outcome.interpretation.id,
            user: outcome.user.id,
            user_username: outcome.user.username,
            spread: outcome.spread.id,
            spread_name: outcome.spread.name,
            ai_response: outcome.interpretation.ai_response,
            user_context: outcome.interpretation.user_context,
            created_at: outcome.interpretation.created_at,
            success: true,
            ai_service_status: outcome.source,
        }
    }
}

#[derive(Serialize)]
pub struct DrawResponse {
    pub success: bool,
    pub interpretation_id: String,
    pub spread_name: String,
    pub cards_names: Vec<String>,
    pub cards_images: Vec<String>,
    pub cards_used: Vec<CardUsed>,
    pub new_balance: i64,
}

impl From<DrawOutcome> for DrawResponse {
    fn from(outcome: DrawOutcome) -> Self {
        Self {
            success: true,
            cards_names: card_names(&outcome.cards),
            cards_images: card_images(&outcome.cards),
            cards_used: outcome.cards.iter().map(CardUsed::from).collect(),
            interpretation_id: outcome.interpretation.id,
            spread_name: outcome.spread.name,
            new_balance: outcome.new_balance,
        }
    }
}

#[derive(Serialize)]
pub struct TestPaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment: Payment,
    pub new_balance: i64,
    pub subscription_end: Option<NaiveDate>,
}
