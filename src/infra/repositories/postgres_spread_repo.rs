use crate::domain::{models::spread::Spread, ports::SpreadRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSpreadRepo {
    pool: PgPool,
}

impl PostgresSpreadRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpreadRepository for PostgresSpreadRepo {
    async fn create(&self, spread: &Spread) -> Result<Spread, AppError> {
        sqlx::query_as::<_, Spread>("INSERT INTO spreads (id, project_id, name, description, num_cards, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *")
            .bind(&spread.id).bind(&spread.project_id).bind(&spread.name).bind(&spread.description)
            .bind(spread.num_cards).bind(spread.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Spread>, AppError> {
        sqlx::query_as::<_, Spread>("SELECT * FROM spreads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Spread>, AppError> {
        sqlx::query_as::<_, Spread>("SELECT * FROM spreads WHERE project_id = $1 ORDER BY created_at ASC, name ASC")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
