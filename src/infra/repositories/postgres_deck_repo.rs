use crate::domain::{models::deck::{Card, Deck}, ports::DeckRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresDeckRepo {
    pool: PgPool,
}

impl PostgresDeckRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeckRepository for PostgresDeckRepo {
    async fn create(&self, deck: &Deck) -> Result<Deck, AppError> {
        sqlx::query_as::<_, Deck>("INSERT INTO decks (id, project_id, name, description, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *")
            .bind(&deck.id).bind(&deck.project_id).bind(&deck.name).bind(&deck.description).bind(deck.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Deck>, AppError> {
        sqlx::query_as::<_, Deck>("SELECT * FROM decks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn add_card(&self, card: &Card) -> Result<Card, AppError> {
        sqlx::query_as::<_, Card>(
            "INSERT INTO cards (id, deck_id, name, image_url, meaning_upright, meaning_reversed, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
            .bind(&card.id).bind(&card.deck_id).bind(&card.name).bind(&card.image_url)
            .bind(&card.meaning_upright).bind(&card.meaning_reversed).bind(card.sort_order)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, AppError> {
        sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE deck_id = $1 ORDER BY sort_order ASC, name ASC")
            .bind(deck_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_cards_for_project(&self, project_id: &str) -> Result<Vec<Card>, AppError> {
        sqlx::query_as::<_, Card>(
            "SELECT c.* FROM cards c
             JOIN decks d ON d.id = c.deck_id
             WHERE d.project_id = $1
             ORDER BY c.deck_id, c.sort_order, c.name"
        )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
