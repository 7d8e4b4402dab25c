use crate::domain::models::{
    project::Project, user::User, deck::{Deck, Card, DrawnCard}, spread::Spread,
    interpretation::Interpretation, package::Package,
    payment::{Payment, PaymentStatus},
};
use crate::domain::services::ledger::EntitlementChange;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<Project, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, AppError>;
    async fn list(&self) -> Result<Vec<Project>, AppError>;
    async fn list_active(&self) -> Result<Vec<Project>, AppError>;
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str
    ) -> Result<String, AppError>;

    /// Whether the client has what it needs to make calls at all.
    fn is_initialized(&self) -> bool;

    async fn check_connection(&self) -> bool;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn get_or_create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_telegram_id(&self, project_id: &str, telegram_user_id: i64) -> Result<Option<User>, AppError>;
    /// Decrements the balance by one only if it is positive. Returns the new balance,
    /// or `None` when there was nothing to debit.
    async fn debit_if_positive(&self, id: &str) -> Result<Option<i64>, AppError>;
    async fn credit(&self, id: &str, amount: i64) -> Result<User, AppError>;
    async fn set_subscription(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<User, AppError>;
}

#[async_trait]
pub trait DeckRepository: Send + Sync {
    async fn create(&self, deck: &Deck) -> Result<Deck, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Deck>, AppError>;
    async fn add_card(&self, card: &Card) -> Result<Card, AppError>;
    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, AppError>;
    /// Every card of every deck the project owns.
    async fn list_cards_for_project(&self, project_id: &str) -> Result<Vec<Card>, AppError>;
}

#[async_trait]
pub trait SpreadRepository: Send + Sync {
    async fn create(&self, spread: &Spread) -> Result<Spread, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Spread>, AppError>;
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Spread>, AppError>;
}

#[async_trait]
pub trait InterpretationRepository: Send + Sync {
    /// Debits one reading from the owner and persists the pending interpretation with its
    /// drawn cards, all in one transaction. Fails with `InsufficientBalance` when the
    /// guarded debit finds nothing to take.
    async fn create_with_debit(&self, interpretation: &Interpretation, cards: &[DrawnCard]) -> Result<(Interpretation, i64), AppError>;
    async fn find_for_reading(&self, id: &str, user_id: &str, spread_id: &str) -> Result<Option<Interpretation>, AppError>;
    async fn list_cards(&self, interpretation_id: &str) -> Result<Vec<DrawnCard>, AppError>;
    async fn update_text(&self, id: &str, ai_response: &str, user_context: Option<&str>) -> Result<Interpretation, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Interpretation>, AppError>;
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn create(&self, package: &Package) -> Result<Package, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError>;
    async fn list_active_by_project(&self, project_id: &str) -> Result<Vec<Package>, AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<Payment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Payment>, AppError>;
    /// Moves a non-terminal payment into `status` and applies `change` in the same
    /// transaction. A payment that is already terminal yields `AlreadySettled` and
    /// nothing is written.
    async fn settle(
        &self,
        id: &str,
        status: PaymentStatus,
        completed_at: Option<DateTime<Utc>>,
        change: Option<&EntitlementChange>
    ) -> Result<Payment, AppError>;
}
