use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Interpretation {
    pub id: String,
    pub user_id: String,
    pub spread_id: String,
    pub ai_response: String,
    pub user_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Interpretation {
    /// A pending interpretation: the text is filled in once generation completes.
    pub fn pending(user_id: String, spread_id: String, user_context: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            spread_id,
            ai_response: String::new(),
            user_context,
            created_at: Utc::now(),
        }
    }
}
