use std::sync::Arc;
use std::time::Duration;
use crate::domain::ports::{
    DeckRepository, InterpretationRepository, LlmService, PackageRepository,
    PaymentRepository, ProjectRepository, SpreadRepository, UserRepository,
};
use crate::domain::services::{
    bot::{load_templates, BotDispatcher},
    interpretation_provider::InterpretationProvider,
    ledger::EntitlementLedger,
    reading_service::ReadingService,
    settlement::SettlementService,
};
use crate::config::Config;
use crate::error::AppError;

/// One implementation per port, all backed by the same pool.
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub users: Arc<dyn UserRepository>,
    pub decks: Arc<dyn DeckRepository>,
    pub spreads: Arc<dyn SpreadRepository>,
    pub interpretations: Arc<dyn InterpretationRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub deck_repo: Arc<dyn DeckRepository>,
    pub spread_repo: Arc<dyn SpreadRepository>,
    pub interpretation_repo: Arc<dyn InterpretationRepository>,
    pub package_repo: Arc<dyn PackageRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub ledger: Arc<EntitlementLedger>,
    pub provider: Arc<InterpretationProvider>,
    pub reading_service: Arc<ReadingService>,
    pub settlement_service: Arc<SettlementService>,
    pub bot: Arc<BotDispatcher>,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories, llm_service: Option<Arc<dyn LlmService>>) -> Result<Self, AppError> {
        let templates = Arc::new(
            load_templates().map_err(|e| AppError::InternalWithMsg(format!("Failed to load bot templates: {}", e)))?
        );

        let provider = Arc::new(InterpretationProvider::new(
            llm_service,
            config.ai_credentials_configured(),
            Duration::from_secs(config.ai_timeout_secs),
        ));

        let reading_service = Arc::new(ReadingService::new(
            repos.users.clone(),
            repos.spreads.clone(),
            repos.decks.clone(),
            repos.interpretations.clone(),
            provider.clone(),
        ));

        let settlement_service = Arc::new(SettlementService::new(
            repos.payments.clone(),
            repos.packages.clone(),
            repos.users.clone(),
            repos.projects.clone(),
        ));

        let bot = Arc::new(BotDispatcher::new(
            repos.projects.clone(),
            repos.users.clone(),
            repos.spreads.clone(),
            repos.packages.clone(),
            reading_service.clone(),
            templates,
            config.default_user_balance,
        ));

        Ok(Self {
            ledger: Arc::new(EntitlementLedger::new(repos.users.clone())),
            config,
            project_repo: repos.projects,
            user_repo: repos.users,
            deck_repo: repos.decks,
            spread_repo: repos.spreads,
            interpretation_repo: repos.interpretations,
            package_repo: repos.packages,
            payment_repo: repos.payments,
            provider,
            reading_service,
            settlement_service,
            bot,
        })
    }
}
