use std::sync::{Arc, Mutex};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn, instrument};
use crate::domain::models::{
    deck::DrawnCard, interpretation::Interpretation, spread::Spread, user::User,
};
use crate::domain::ports::{DeckRepository, InterpretationRepository, SpreadRepository, UserRepository};
use crate::domain::services::draw::draw;
use crate::domain::services::interpretation_provider::{CardReading, InterpretationProvider, TextSource};
use crate::domain::services::ledger::has_credit;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStage {
    Requested,
    CardsDrawn,
    Debited,
    TextPending,
    Completed,
    Rejected,
}

impl ReadingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStage::Requested => "requested",
            ReadingStage::CardsDrawn => "cards_drawn",
            ReadingStage::Debited => "debited",
            ReadingStage::TextPending => "text_pending",
            ReadingStage::Completed => "completed",
            ReadingStage::Rejected => "rejected",
        }
    }
}

/// Result of phase one: cards are drawn, the reading is paid for and the interpretation
/// row exists with empty text.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub interpretation: Interpretation,
    pub user: User,
    pub spread: Spread,
    pub cards: Vec<DrawnCard>,
    pub new_balance: i64,
}

#[derive(Debug, Clone)]
pub struct ReadingOutcome {
    pub interpretation: Interpretation,
    pub user: User,
    pub spread: Spread,
    pub cards: Vec<DrawnCard>,
    pub source: TextSource,
}

pub struct ReadingService {
    users: Arc<dyn UserRepository>,
    spreads: Arc<dyn SpreadRepository>,
    decks: Arc<dyn DeckRepository>,
    interpretations: Arc<dyn InterpretationRepository>,
    provider: Arc<InterpretationProvider>,
    rng: Mutex<StdRng>,
}

impl ReadingService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        spreads: Arc<dyn SpreadRepository>,
        decks: Arc<dyn DeckRepository>,
        interpretations: Arc<dyn InterpretationRepository>,
        provider: Arc<InterpretationProvider>,
    ) -> Self {
        Self::with_rng(users, spreads, decks, interpretations, provider, StdRng::from_entropy())
    }

    pub fn with_rng(
        users: Arc<dyn UserRepository>,
        spreads: Arc<dyn SpreadRepository>,
        decks: Arc<dyn DeckRepository>,
        interpretations: Arc<dyn InterpretationRepository>,
        provider: Arc<InterpretationProvider>,
        rng: StdRng,
    ) -> Self {
        Self { users, spreads, decks, interpretations, provider, rng: Mutex::new(rng) }
    }

    /// Phase one. Every rejection happens before the debit transaction commits.
    #[instrument(skip(self, user_context))]
    pub async fn draw_cards(&self, user_id: &str, spread_id: &str, user_context: Option<String>) -> Result<DrawOutcome, AppError> {
        stage(ReadingStage::Requested, user_id, spread_id, None);

        let (mut user, spread) = self.load_participants(user_id, spread_id).await?;

        if !has_credit(&user) {
            reject(user_id, spread_id, "insufficient balance");
            return Err(AppError::InsufficientBalance);
        }

        let needed = usize::try_from(spread.num_cards)
            .map_err(|_| AppError::Validation("Spread card count must be positive".into()))?;
        let pool = self.decks.list_cards_for_project(&spread.project_id).await?;

        let cards = {
            let mut rng = self.rng.lock().map_err(|_| AppError::Internal)?;
            draw(&pool, needed, &mut *rng)
        };
        let cards = cards.inspect_err(|_| reject(user_id, spread_id, "insufficient cards"))?;
        stage(ReadingStage::CardsDrawn, user_id, spread_id, None);

        let pending = Interpretation::pending(user.id.clone(), spread.id.clone(), user_context);
        let (interpretation, new_balance) = self.interpretations
            .create_with_debit(&pending, &cards)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::InsufficientBalance) {
                    reject(user_id, spread_id, "balance taken by a concurrent reading");
                }
            })?;

        user.balance = new_balance;
        stage(ReadingStage::Debited, user_id, spread_id, Some(&interpretation.id));
        stage(ReadingStage::TextPending, user_id, spread_id, Some(&interpretation.id));

        Ok(DrawOutcome { interpretation, user, spread, cards, new_balance })
    }

    /// Phase two and reuse-by-id. Cards and orientations are read back from storage, and
    /// nothing is debited.
    #[instrument(skip(self, user_context))]
    pub async fn complete_reading(
        &self,
        interpretation_id: &str,
        user_id: &str,
        spread_id: &str,
        user_context: Option<String>,
    ) -> Result<ReadingOutcome, AppError> {
        let (user, spread) = self.load_participants(user_id, spread_id).await?;

        let interpretation = match self.interpretations.find_for_reading(interpretation_id, &user.id, &spread.id).await? {
            Some(i) => i,
            None => {
                reject(user_id, spread_id, "interpretation not found");
                return Err(AppError::NotFound("Interpretation not found".into()));
            }
        };

        let cards = self.interpretations.list_cards(&interpretation.id).await?;
        let context = user_context.or(interpretation.user_context.clone());

        self.finish(user, spread, interpretation, cards, context).await
    }

    /// Atomic path: draw, debit, generate and store the text in one call. With an
    /// `interpretation_id` this regenerates an existing reading instead.
    pub async fn perform_reading(
        &self,
        user_id: &str,
        spread_id: &str,
        user_context: Option<String>,
        interpretation_id: Option<&str>,
    ) -> Result<ReadingOutcome, AppError> {
        if let Some(id) = interpretation_id {
            return self.complete_reading(id, user_id, spread_id, user_context).await;
        }

        let drawn = self.draw_cards(user_id, spread_id, user_context).await?;
        let context = drawn.interpretation.user_context.clone();
        self.finish(drawn.user, drawn.spread, drawn.interpretation, drawn.cards, context).await
    }

    async fn finish(
        &self,
        user: User,
        spread: Spread,
        interpretation: Interpretation,
        cards: Vec<DrawnCard>,
        user_context: Option<String>,
    ) -> Result<ReadingOutcome, AppError> {
        let readings: Vec<CardReading> = cards.iter().map(CardReading::from).collect();
        let generated = self.provider.generate(&spread.name, &readings, user_context.as_deref()).await;

        let interpretation = self.interpretations
            .update_text(&interpretation.id, &generated.text, user_context.as_deref())
            .await?;

        stage(ReadingStage::Completed, &user.id, &spread.id, Some(&interpretation.id));

        Ok(ReadingOutcome { interpretation, user, spread, cards, source: generated.source })
    }

    async fn load_participants(&self, user_id: &str, spread_id: &str) -> Result<(User, Spread), AppError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            reject(user_id, spread_id, "user not found");
            return Err(AppError::NotFound("User not found".into()));
        };

        // A spread of another project does not exist as far as this user is concerned.
        match self.spreads.find_by_id(spread_id).await? {
            Some(spread) if spread.project_id == user.project_id => Ok((user, spread)),
            _ => {
                reject(user_id, spread_id, "spread not found");
                Err(AppError::NotFound("Spread not found".into()))
            }
        }
    }
}

fn stage(stage: ReadingStage, user_id: &str, spread_id: &str, interpretation_id: Option<&str>) {
    info!(
        stage = stage.as_str(),
        user_id,
        spread_id,
        interpretation_id = interpretation_id.unwrap_or_default(),
        "Reading stage"
    );
}

fn reject(user_id: &str, spread_id: &str, reason: &str) {
    warn!(stage = ReadingStage::Rejected.as_str(), user_id, spread_id, reason, "Reading rejected");
}
