use crate::domain::{models::user::User, ports::UserRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepo {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, project_id, telegram_user_id, username, balance, subscription_start, subscription_end, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *"
        )
            .bind(&user.id).bind(&user.project_id).bind(user.telegram_user_id).bind(&user.username)
            .bind(user.balance).bind(user.subscription_start).bind(user.subscription_end)
            .bind(user.created_at).bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn get_or_create(&self, user: &User) -> Result<User, AppError> {
        sqlx::query(
            "INSERT INTO users (id, project_id, telegram_user_id, username, balance, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (project_id, telegram_user_id) DO NOTHING"
        )
            .bind(&user.id).bind(&user.project_id).bind(user.telegram_user_id).bind(&user.username)
            .bind(user.balance).bind(user.created_at).bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.find_by_telegram_id(&user.project_id, user.telegram_user_id).await?
            .ok_or(AppError::InternalWithMsg("User vanished after upsert".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_telegram_id(&self, project_id: &str, telegram_user_id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE project_id = $1 AND telegram_user_id = $2")
            .bind(project_id)
            .bind(telegram_user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn debit_if_positive(&self, id: &str) -> Result<Option<i64>, AppError> {
        sqlx::query_scalar::<_, i64>("UPDATE users SET balance = balance - 1, updated_at = $1 WHERE id = $2 AND balance > 0 RETURNING balance")
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn credit(&self, id: &str, amount: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET balance = balance + $1, updated_at = $2 WHERE id = $3 RETURNING *")
            .bind(amount)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User not found".into()))
    }

    async fn set_subscription(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET subscription_start = $1, subscription_end = $2, updated_at = $3 WHERE id = $4 RETURNING *")
            .bind(start)
            .bind(end)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User not found".into()))
    }
}
