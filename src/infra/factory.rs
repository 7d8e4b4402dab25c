use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::LlmService;
use crate::state::{AppState, Repositories};
use crate::infra::ai::yandex_gpt_service::YandexGptService;
use crate::infra::repositories::{
    postgres_project_repo::PostgresProjectRepo, postgres_user_repo::PostgresUserRepo,
    postgres_deck_repo::PostgresDeckRepo, postgres_spread_repo::PostgresSpreadRepo,
    postgres_interpretation_repo::PostgresInterpretationRepo, postgres_package_repo::PostgresPackageRepo,
    postgres_payment_repo::PostgresPaymentRepo,
    sqlite_project_repo::SqliteProjectRepo, sqlite_user_repo::SqliteUserRepo,
    sqlite_deck_repo::SqliteDeckRepo, sqlite_spread_repo::SqliteSpreadRepo,
    sqlite_interpretation_repo::SqliteInterpretationRepo, sqlite_package_repo::SqlitePackageRepo,
    sqlite_payment_repo::SqlitePaymentRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if !config.ai_credentials_configured() {
        warn!("YandexGPT is not configured: YANDEX_API_KEY or YANDEX_FOLDER_ID missing. Fallback interpretations will be used");
    }
    let llm_service: Arc<dyn LlmService> = Arc::new(YandexGptService::new(
        config.yandex_api_key.clone(),
        config.yandex_folder_id.clone(),
        config.yandex_api_url.clone(),
        config.yandex_model.clone(),
        Duration::from_secs(config.ai_timeout_secs),
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(pool)
    };

    AppState::new(config.clone(), repos, Some(llm_service)).expect("Failed to build application state")
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        projects: Arc::new(SqliteProjectRepo::new(pool.clone())),
        users: Arc::new(SqliteUserRepo::new(pool.clone())),
        decks: Arc::new(SqliteDeckRepo::new(pool.clone())),
        spreads: Arc::new(SqliteSpreadRepo::new(pool.clone())),
        interpretations: Arc::new(SqliteInterpretationRepo::new(pool.clone())),
        packages: Arc::new(SqlitePackageRepo::new(pool.clone())),
        payments: Arc::new(SqlitePaymentRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        projects: Arc::new(PostgresProjectRepo::new(pool.clone())),
        users: Arc::new(PostgresUserRepo::new(pool.clone())),
        decks: Arc::new(PostgresDeckRepo::new(pool.clone())),
        spreads: Arc::new(PostgresSpreadRepo::new(pool.clone())),
        interpretations: Arc::new(PostgresInterpretationRepo::new(pool.clone())),
        packages: Arc::new(PostgresPackageRepo::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepo::new(pool)),
    }
}

pub async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
