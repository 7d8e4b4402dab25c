use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tera::{Context, Tera};
use tracing::{info, warn};
use crate::domain::models::{
    package::{Package, PackageEffect},
    project::Project,
    user::User,
};
use crate::domain::ports::{PackageRepository, ProjectRepository, SpreadRepository, UserRepository};
use crate::domain::services::ledger::{has_credit, is_subscription_active};
use crate::domain::services::reading_service::ReadingService;
use crate::error::AppError;

pub const NO_CREDIT_REPLY: &str = "❌ You have run out of readings!\nUse /packages to buy more.";
pub const NO_SPREADS_REPLY: &str = "❌ No spreads available.";
pub const NOT_ENOUGH_CARDS_REPLY: &str = "❌ Not enough cards for the spread.";
pub const NO_PACKAGES_REPLY: &str = "❌ No packages available.";
pub const UNKNOWN_COMMAND_REPLY: &str = "Unknown command. Use /help for reference.";
pub const TEXT_HINT_REPLY: &str = "Use commands to talk to the bot. /help for reference.";
pub const UNKNOWN_TYPE_REPLY: &str = "Unknown message type";

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("bot/start.txt", include_str!("../../templates/bot/start.txt")),
        ("bot/help.txt", include_str!("../../templates/bot/help.txt")),
        ("bot/tarot.txt", include_str!("../../templates/bot/tarot.txt")),
        ("bot/balance.txt", include_str!("../../templates/bot/balance.txt")),
        ("bot/packages.txt", include_str!("../../templates/bot/packages.txt")),
    ])?;
    Ok(tera)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Tarot,
    Balance,
    Packages,
    Unknown,
}

impl BotCommand {
    /// Accepts `/tarot`, `tarot`, `/tarot@SomeBot` and trailing arguments.
    pub fn parse(raw: &str) -> Self {
        let word = raw.split_whitespace().next().unwrap_or_default();
        let word = word.strip_prefix('/').unwrap_or(word);
        let word = word.split('@').next().unwrap_or_default();

        match word.to_lowercase().as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "tarot" => BotCommand::Tarot,
            "balance" => BotCommand::Balance,
            "packages" => BotCommand::Packages,
            _ => BotCommand::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotMessage {
    pub kind: String,
    pub command: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotReply {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub bot_identity: String,
}

pub struct BotDispatcher {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
    spreads: Arc<dyn SpreadRepository>,
    packages: Arc<dyn PackageRepository>,
    readings: Arc<ReadingService>,
    templates: Arc<Tera>,
    default_balance: i64,
}

impl BotDispatcher {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
        spreads: Arc<dyn SpreadRepository>,
        packages: Arc<dyn PackageRepository>,
        readings: Arc<ReadingService>,
        templates: Arc<Tera>,
        default_balance: i64,
    ) -> Self {
        Self { projects, users, spreads, packages, readings, templates, default_balance }
    }

    pub async fn active_bots(&self) -> Result<Vec<Project>, AppError> {
        self.projects.list_active().await
    }

    pub async fn handle(&self, project_id: &str, message: BotMessage) -> Result<BotReply, AppError> {
        let project = match self.projects.find_by_id(project_id).await? {
            Some(p) if p.is_active() => p,
            _ => {
                warn!("Bot message for unknown or inactive project {}", project_id);
                return Err(AppError::Validation(format!("Project {} not found or inactive", project_id)));
            }
        };

        let text = match message.kind.as_str() {
            "command" => self.handle_command(&project, &message).await?,
            "text" => TEXT_HINT_REPLY.to_string(),
            _ => UNKNOWN_TYPE_REPLY.to_string(),
        };

        Ok(BotReply {
            kind: "text".to_string(),
            text,
            timestamp: Utc::now(),
            bot_identity: project.bot_identity(),
        })
    }

    async fn handle_command(&self, project: &Project, message: &BotMessage) -> Result<String, AppError> {
        let telegram_user_id = message.user_id
            .ok_or(AppError::Validation("user_id is required for commands".into()))?;

        let user = self.users.get_or_create(&User::new(
            project.id.clone(),
            telegram_user_id,
            message.username.clone().filter(|u| !u.is_empty()),
            self.default_balance,
        )).await?;

        let command = BotCommand::parse(message.command.as_deref().unwrap_or_default());
        info!("Bot {} handling {:?} for user {}", project.bot_identity(), command, user.id);

        match command {
            BotCommand::Start => self.render("bot/start.txt", json!({
                "project_name": project.name,
                "balance": user.balance,
            })),
            BotCommand::Help => self.render("bot/help.txt", json!({ "project_name": project.name })),
            BotCommand::Tarot => self.tarot(project, &user).await,
            BotCommand::Balance => self.render("bot/balance.txt", balance_context(&user, Utc::now())),
            BotCommand::Packages => {
                let packages = self.packages.list_active_by_project(&project.id).await?;
                if packages.is_empty() {
                    return Ok(NO_PACKAGES_REPLY.to_string());
                }
                self.render("bot/packages.txt", packages_context(&packages))
            }
            BotCommand::Unknown => Ok(UNKNOWN_COMMAND_REPLY.to_string()),
        }
    }

    async fn tarot(&self, project: &Project, user: &User) -> Result<String, AppError> {
        if !has_credit(user) {
            return Ok(NO_CREDIT_REPLY.to_string());
        }
        let Some(spread) = self.spreads.list_by_project(&project.id).await?.into_iter().next() else {
            return Ok(NO_SPREADS_REPLY.to_string());
        };

        match self.readings.perform_reading(&user.id, &spread.id, None, None).await {
            Ok(outcome) => {
                let cards: Vec<_> = outcome.cards.iter()
                    .map(|c| json!({ "name": c.card.name, "is_reversed": c.is_reversed() }))
                    .collect();
                self.render("bot/tarot.txt", json!({
                    "spread_name": outcome.spread.name,
                    "cards": cards,
                    "interpretation": outcome.interpretation.ai_response,
                    "balance": outcome.user.balance,
                }))
            }
            Err(AppError::InsufficientBalance) => Ok(NO_CREDIT_REPLY.to_string()),
            Err(AppError::InsufficientCards { .. }) => Ok(NOT_ENOUGH_CARDS_REPLY.to_string()),
            Err(e) => Err(e),
        }
    }

    fn render(&self, name: &str, data: serde_json::Value) -> Result<String, AppError> {
        render(&self.templates, name, data)
    }
}

fn render(tera: &Tera, name: &str, data: serde_json::Value) -> Result<String, AppError> {
    let context = Context::from_value(data).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
    let text = tera.render(name, &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to render {}: {}", name, e)))?;
    Ok(text.trim().to_string())
}

fn balance_context(user: &User, now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "balance": user.balance,
        "has_subscription": user.subscription_start.is_some() && user.subscription_end.is_some(),
        "subscription_active": is_subscription_active(user, now.date_naive()),
        "subscription_end": user.subscription_end.map(|d| d.format("%d.%m.%Y").to_string()),
    })
}

fn packages_context(packages: &[Package]) -> serde_json::Value {
    let items: Vec<_> = packages.iter()
        .map(|p| {
            let effect = match p.effect() {
                Ok(PackageEffect::OneTime { num_readings }) => format!("{} readings", num_readings),
                Ok(PackageEffect::Subscription { days }) => format!("{} days of subscription", days),
                Err(_) => "unavailable".to_string(),
            };
            json!({ "name": p.name, "price": p.display_price(), "effect": effect })
        })
        .collect();
    json!({ "packages": items })
}
