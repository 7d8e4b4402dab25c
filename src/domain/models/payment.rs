use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled)
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown payment status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl SettlementOutcome {
    pub fn status(&self) -> PaymentStatus {
        match self {
            SettlementOutcome::Completed => PaymentStatus::Completed,
            SettlementOutcome::Failed => PaymentStatus::Failed,
            SettlementOutcome::Cancelled => PaymentStatus::Cancelled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub package_id: String,
    /// Minor currency units, copied from the package price at creation.
    pub amount: i64,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct NewPaymentParams {
    pub user_id: String,
    pub project_id: String,
    pub package_id: String,
    pub amount: i64,
    pub external_id: Option<String>,
    pub payment_url: Option<String>,
}

impl Payment {
    pub fn new(params: NewPaymentParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            project_id: params.project_id,
            package_id: params.package_id,
            amount: params.amount,
            status: PaymentStatus::Pending,
            external_id: params.external_id,
            payment_url: params.payment_url,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}
