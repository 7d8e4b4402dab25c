use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Spread {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub num_cards: i64,
    pub created_at: DateTime<Utc>,
}

impl Spread {
    pub fn new(project_id: String, name: String, description: String, num_cards: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            name,
            description,
            num_cards,
            created_at: Utc::now(),
        }
    }
}
