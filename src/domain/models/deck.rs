use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Deck {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(project_id: String, name: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            name,
            description,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub meaning_upright: String,
    pub meaning_reversed: String,
    #[serde(rename = "order")]
    pub sort_order: i64,
}

pub struct NewCardParams {
    pub deck_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub meaning_upright: String,
    pub meaning_reversed: String,
    pub sort_order: i64,
}

impl Card {
    pub fn new(params: NewCardParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            deck_id: params.deck_id,
            name: params.name,
            image_url: params.image_url,
            meaning_upright: params.meaning_upright,
            meaning_reversed: params.meaning_reversed,
            sort_order: params.sort_order,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn from_reversed(is_reversed: bool) -> Self {
        if is_reversed { Orientation::Reversed } else { Orientation::Upright }
    }

    pub fn is_reversed(&self) -> bool {
        matches!(self, Orientation::Reversed)
    }
}

/// A card as it came out of one draw.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DrawnCard {
    pub card: Card,
    pub orientation: Orientation,
}

impl DrawnCard {
    pub fn is_reversed(&self) -> bool {
        self.orientation.is_reversed()
    }

    /// Meaning text for the orientation the card was drawn in.
    pub fn effective_meaning(&self) -> &str {
        match self.orientation {
            Orientation::Upright => &self.card.meaning_upright,
            Orientation::Reversed => &self.card.meaning_reversed,
        }
    }
}

/// Row shape of an `interpretation_cards` join.
#[derive(Debug, FromRow)]
pub struct DrawnCardRow {
    #[sqlx(flatten)]
    pub card: Card,
    pub is_reversed: bool,
    pub position: i64,
}

impl From<DrawnCardRow> for DrawnCard {
    fn from(row: DrawnCardRow) -> Self {
        Self {
            card: row.card,
            orientation: Orientation::from_reversed(row.is_reversed),
        }
    }
}
