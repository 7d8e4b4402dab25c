use crate::domain::{
    models::payment::{Payment, PaymentStatus},
    ports::PaymentRepository,
    services::ledger::EntitlementChange,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn create(&self, payment: &Payment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, user_id, project_id, package_id, amount, status, external_id, payment_url, created_at, updated_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&payment.id).bind(&payment.user_id).bind(&payment.project_id).bind(&payment.package_id)
            .bind(payment.amount).bind(payment.status.as_str()).bind(&payment.external_id).bind(&payment.payment_url)
            .bind(payment.created_at).bind(payment.updated_at).bind(payment.completed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn settle(
        &self,
        id: &str,
        status: PaymentStatus,
        completed_at: Option<DateTime<Utc>>,
        change: Option<&EntitlementChange>
    ) -> Result<Payment, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let settled = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = ?, completed_at = COALESCE(?, completed_at), updated_at = ?
             WHERE id = ? AND status IN ('pending', 'processing')
             RETURNING *"
        )
            .bind(status.as_str()).bind(completed_at).bind(now).bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(settled) = settled else {
            let current = sqlx::query_scalar::<_, String>("SELECT status FROM payments WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            return match current {
                Some(status) => Err(AppError::AlreadySettled(status)),
                None => Err(AppError::NotFound("Payment not found".into())),
            };
        };

        if let Some(change) = change {
            let result = match change {
                EntitlementChange::Credit { user_id, readings } => {
                    sqlx::query("UPDATE users SET balance = balance + ?, updated_at = ? WHERE id = ?")
                        .bind(readings).bind(now).bind(user_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(AppError::Database)?
                }
                EntitlementChange::Subscription { user_id, start, end } => {
                    sqlx::query("UPDATE users SET subscription_start = ?, subscription_end = ?, updated_at = ? WHERE id = ?")
                        .bind(start).bind(end).bind(now).bind(user_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(AppError::Database)?
                }
            };
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("User not found".into()));
            }
            info!("Applied {:?} for payment {}", change, id);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(settled)
    }
}
