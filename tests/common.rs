#![allow(dead_code)]

use tarot_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::ports::LlmService,
    error::AppError,
    infra::factory::sqlite_repositories,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const MOCK_INTERPRETATION: &str = "Mock interpretation: the cards speak of clarity.";

pub struct MockLlmService;

#[async_trait]
impl LlmService for MockLlmService {
    async fn generate(&self, _prompt: &str, _system_instruction: &str) -> Result<String, AppError> {
        Ok(MOCK_INTERPRETATION.to_string())
    }

    fn is_initialized(&self) -> bool {
        true
    }

    async fn check_connection(&self) -> bool {
        true
    }
}

pub struct FailingLlmService;

#[async_trait]
impl LlmService for FailingLlmService {
    async fn generate(&self, _prompt: &str, _system_instruction: &str) -> Result<String, AppError> {
        Err(AppError::ProviderUnavailable("connection refused".into()))
    }

    fn is_initialized(&self) -> bool {
        true
    }

    async fn check_connection(&self) -> bool {
        false
    }
}

/// Remembers every prompt it was given.
#[derive(Default)]
pub struct RecordingLlmService {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmService for RecordingLlmService {
    async fn generate(&self, prompt: &str, _system_instruction: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(MOCK_INTERPRETATION.to_string())
    }

    fn is_initialized(&self) -> bool {
        true
    }

    async fn check_connection(&self) -> bool {
        true
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_llm(Some(Arc::new(MockLlmService))).await
    }

    pub async fn with_llm(llm_service: Option<Arc<dyn LlmService>>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            yandex_api_key: None,
            yandex_folder_id: None,
            yandex_api_url: "http://localhost".to_string(),
            yandex_model: "yandexgpt-lite".to_string(),
            ai_timeout_secs: 2,
            default_user_balance: 5,
        };

        let state = Arc::new(
            AppState::new(config, sqlite_repositories(pool.clone()), llm_service)
                .expect("Failed to build test state")
        );
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn create_project(&self, name: &str) -> String {
        let token = format!("{}:{}", rand_bot_id(), Uuid::new_v4());
        let (status, body) = self.post("/projects", json!({ "name": name, "telegram_token": token })).await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// A deck called "Major Arcana" with `count` cards named "Card 0".."Card n".
    pub async fn create_deck(&self, project_id: &str, count: usize) -> String {
        let (status, deck) = self.post("/decks", json!({ "project": project_id, "name": "Major Arcana" })).await;
        assert_eq!(status, StatusCode::CREATED, "create deck failed: {}", deck);
        let deck_id = deck["id"].as_str().unwrap().to_string();

        for i in 0..count {
            let (status, card) = self.post(&format!("/decks/{}/cards", deck_id), json!({
                "name": format!("Card {}", i),
                "image_url": format!("/media/cards/{}.jpg", i),
                "meaning_upright": format!("Upright meaning {}", i),
                "meaning_reversed": format!("Reversed meaning {}", i),
                "order": i,
            })).await;
            assert_eq!(status, StatusCode::CREATED, "add card failed: {}", card);
        }
        deck_id
    }

    pub async fn create_spread(&self, project_id: &str, name: &str, num_cards: i64) -> String {
        let (status, body) = self.post("/spreads", json!({
            "project": project_id,
            "name": name,
            "description": "A test spread",
            "num_cards": num_cards,
        })).await;
        assert_eq!(status, StatusCode::CREATED, "create spread failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_user(&self, project_id: &str, telegram_user_id: i64, balance: i64) -> String {
        let (status, body) = self.post("/users", json!({
            "project": project_id,
            "telegram_user_id": telegram_user_id,
            "username": format!("seeker{}", telegram_user_id),
            "balance": balance,
        })).await;
        assert_eq!(status, StatusCode::OK, "create user failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_package(&self, body: Value) -> String {
        let (status, created) = self.post("/packages", body).await;
        assert_eq!(status, StatusCode::CREATED, "create package failed: {}", created);
        created["id"].as_str().unwrap().to_string()
    }

    pub async fn user(&self, user_id: &str) -> Value {
        let (status, body) = self.get(&format!("/users/{}", user_id)).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    pub async fn balance(&self, user_id: &str) -> i64 {
        self.user(user_id).await["balance"].as_i64().unwrap()
    }

    /// Project with a 10 card deck, a 3 card spread and one user.
    pub async fn seed_reading(&self, balance: i64) -> (String, String, String) {
        let project_id = self.create_project("Mystic Tarot").await;
        self.create_deck(&project_id, 10).await;
        let spread_id = self.create_spread(&project_id, "Past, Present, Future", 3).await;
        let user_id = self.create_user(&project_id, 1001, balance).await;
        (project_id, spread_id, user_id)
    }
}

fn rand_bot_id() -> u32 {
    Uuid::new_v4().as_u128() as u32 % 900_000 + 100_000
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
