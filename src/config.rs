use std::env;

pub const DEFAULT_YANDEX_API_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub yandex_api_key: Option<String>,
    pub yandex_folder_id: Option<String>,
    pub yandex_api_url: String,
    pub yandex_model: String,
    pub ai_timeout_secs: u64,
    pub default_user_balance: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            yandex_api_key: non_empty_var("YANDEX_API_KEY"),
            yandex_folder_id: non_empty_var("YANDEX_FOLDER_ID"),
            yandex_api_url: env::var("YANDEX_API_URL").unwrap_or_else(|_| DEFAULT_YANDEX_API_URL.to_string()),
            yandex_model: env::var("YANDEX_MODEL").unwrap_or_else(|_| "yandexgpt-lite".to_string()),
            ai_timeout_secs: env::var("AI_TIMEOUT_SECS").unwrap_or_else(|_| "20".to_string()).parse().expect("AI_TIMEOUT_SECS must be a number"),
            default_user_balance: env::var("DEFAULT_USER_BALANCE").unwrap_or_else(|_| "5".to_string()).parse().expect("DEFAULT_USER_BALANCE must be a number"),
        }
    }

    pub fn ai_credentials_configured(&self) -> bool {
        self.yandex_api_key.is_some() && self.yandex_folder_id.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
