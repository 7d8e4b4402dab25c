use crate::domain::{
    models::{deck::{DrawnCard, DrawnCardRow}, interpretation::Interpretation},
    ports::InterpretationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteInterpretationRepo {
    pool: SqlitePool,
}

impl SqliteInterpretationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterpretationRepository for SqliteInterpretationRepo {
    async fn create_with_debit(&self, interpretation: &Interpretation, cards: &[DrawnCard]) -> Result<(Interpretation, i64), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // The guarded debit must be the first statement so it takes the write lock.
        let balance = sqlx::query_scalar::<_, i64>("UPDATE users SET balance = balance - 1, updated_at = ? WHERE id = ? AND balance > 0 RETURNING balance")
            .bind(Utc::now())
            .bind(&interpretation.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let Some(balance) = balance else {
            return Err(AppError::InsufficientBalance);
        };

        let created = sqlx::query_as::<_, Interpretation>(
            "INSERT INTO interpretations (id, user_id, spread_id, ai_response, user_context, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&interpretation.id).bind(&interpretation.user_id).bind(&interpretation.spread_id)
            .bind(&interpretation.ai_response).bind(&interpretation.user_context).bind(interpretation.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for (position, drawn) in cards.iter().enumerate() {
            sqlx::query("INSERT INTO interpretation_cards (interpretation_id, card_id, position, is_reversed) VALUES (?, ?, ?, ?)")
                .bind(&created.id).bind(&drawn.card.id).bind(position as i64).bind(drawn.is_reversed())
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok((created, balance))
    }

    async fn find_for_reading(&self, id: &str, user_id: &str, spread_id: &str) -> Result<Option<Interpretation>, AppError> {
        sqlx::query_as::<_, Interpretation>("SELECT * FROM interpretations WHERE id = ? AND user_id = ? AND spread_id = ?")
            .bind(id).bind(user_id).bind(spread_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_cards(&self, interpretation_id: &str) -> Result<Vec<DrawnCard>, AppError> {
        let rows = sqlx::query_as::<_, DrawnCardRow>(
            "SELECT c.id, c.deck_id, c.name, c.image_url, c.meaning_upright, c.meaning_reversed, c.sort_order,
                    ic.is_reversed, ic.position
             FROM interpretation_cards ic
             JOIN cards c ON c.id = ic.card_id
             WHERE ic.interpretation_id = ?
             ORDER BY ic.position ASC"
        )
            .bind(interpretation_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(DrawnCard::from).collect())
    }

    async fn update_text(&self, id: &str, ai_response: &str, user_context: Option<&str>) -> Result<Interpretation, AppError> {
        sqlx::query_as::<_, Interpretation>("UPDATE interpretations SET ai_response = ?, user_context = ? WHERE id = ? RETURNING *")
            .bind(ai_response).bind(user_context).bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Interpretation not found".into()))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Interpretation>, AppError> {
        sqlx::query_as::<_, Interpretation>("SELECT * FROM interpretations WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
