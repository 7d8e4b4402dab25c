use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub project_id: String,
    pub telegram_user_id: i64,
    pub username: Option<String>,
    pub balance: i64,
    pub subscription_start: Option<NaiveDate>,
    pub subscription_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(project_id: String, telegram_user_id: i64, username: Option<String>, balance: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            telegram_user_id,
            username,
            balance,
            subscription_start: None,
            subscription_end: None,
            created_at: now,
            updated_at: now,
        }
    }
}
