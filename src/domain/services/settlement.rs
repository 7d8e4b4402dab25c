use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn, instrument};
use crate::domain::models::{
    package::Package,
    payment::{NewPaymentParams, Payment, SettlementOutcome},
    user::User,
};
use crate::domain::ports::{PackageRepository, PaymentRepository, ProjectRepository, UserRepository};
use crate::domain::services::ledger::EntitlementChange;
use crate::error::AppError;

pub const TEST_PAYMENT_PIN: &str = "8712";
pub const TEST_PAYMENT_URL: &str = "https://test-payment.example.com";

pub struct TestPaymentOutcome {
    pub payment: Payment,
    pub user: User,
}

pub struct SettlementService {
    payments: Arc<dyn PaymentRepository>,
    packages: Arc<dyn PackageRepository>,
    users: Arc<dyn UserRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl SettlementService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        packages: Arc<dyn PackageRepository>,
        users: Arc<dyn UserRepository>,
        projects: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self { payments, packages, users, projects }
    }

    /// Opens a pending payment. The amount is the package price at this moment.
    pub async fn create_payment(&self, user_id: &str, project_id: &str, package_id: &str) -> Result<Payment, AppError> {
        let package = self.load_purchase(user_id, project_id, package_id).await?;
        self.open(user_id, &package, None, None).await
    }

    /// Moves a pending or processing payment into a terminal state. Only `Completed` touches
    /// the ledger, and the status guard makes a repeated call fail with `AlreadySettled`.
    #[instrument(skip(self))]
    pub async fn settle(&self, payment_id: &str, outcome: SettlementOutcome) -> Result<Payment, AppError> {
        let payment = self.payments.find_by_id(payment_id).await?
            .ok_or(AppError::NotFound("Payment not found".into()))?;

        if payment.status.is_terminal() {
            warn!("Payment {} is already {}, refusing to settle again", payment.id, payment.status.as_str());
            return Err(AppError::AlreadySettled(payment.status.as_str().to_string()));
        }

        let status = outcome.status();
        let (completed_at, change) = match outcome {
            SettlementOutcome::Completed => {
                let package = self.packages.find_by_id(&payment.package_id).await?
                    .ok_or(AppError::NotFound("Package not found".into()))?;
                let change = EntitlementChange::for_package(&payment.user_id, package.effect()?, Utc::now().date_naive())?;
                (Some(Utc::now()), Some(change))
            }
            SettlementOutcome::Failed | SettlementOutcome::Cancelled => (None, None),
        };

        let settled = self.payments.settle(&payment.id, status, completed_at, change.as_ref()).await?;
        info!("Payment {} settled as {}", settled.id, settled.status.as_str());
        Ok(settled)
    }

    /// Simulated purchase: the PIN is checked before anything else, then a pending payment
    /// is opened and completed through the regular settlement path.
    #[instrument(skip(self, pin_code))]
    pub async fn test_payment(&self, user_id: &str, project_id: &str, package_id: &str, pin_code: &str) -> Result<TestPaymentOutcome, AppError> {
        if pin_code != TEST_PAYMENT_PIN {
            return Err(AppError::Validation(format!("Invalid PIN code. For testing use: {}", TEST_PAYMENT_PIN)));
        }

        let package = self.load_purchase(user_id, project_id, package_id).await?;
        let external_id = format!("test_payment_{}", Utc::now().timestamp_millis());
        let pending = self.open(user_id, &package, Some(external_id), Some(TEST_PAYMENT_URL.to_string())).await?;

        let payment = self.settle(&pending.id, SettlementOutcome::Completed).await?;
        let user = self.users.find_by_id(user_id).await?
            .ok_or(AppError::NotFound("User not found".into()))?;

        Ok(TestPaymentOutcome { payment, user })
    }

    async fn load_purchase(&self, user_id: &str, project_id: &str, package_id: &str) -> Result<Package, AppError> {
        let user = self.users.find_by_id(user_id).await?
            .ok_or(AppError::NotFound("User not found".into()))?;
        self.projects.find_by_id(project_id).await?
            .ok_or(AppError::NotFound("Project not found".into()))?;
        let package = self.packages.find_by_id(package_id).await?
            .ok_or(AppError::NotFound("Package not found".into()))?;

        if !package.is_active {
            return Err(AppError::Validation("Package is not active".into()));
        }
        if user.project_id != project_id {
            return Err(AppError::Validation("User does not belong to this project".into()));
        }
        if package.project_id != project_id {
            return Err(AppError::Validation("Package does not belong to this project".into()));
        }
        package.effect()?;
        Ok(package)
    }

    async fn open(&self, user_id: &str, package: &Package, external_id: Option<String>, payment_url: Option<String>) -> Result<Payment, AppError> {
        let payment = Payment::new(NewPaymentParams {
            user_id: user_id.to_string(),
            project_id: package.project_id.clone(),
            package_id: package.id.clone(),
            amount: package.price,
            external_id,
            payment_url,
        });
        let payment = self.payments.create(&payment).await?;
        info!("Opened payment {} for package {} ({} minor units)", payment.id, package.id, payment.amount);
        Ok(payment)
    }
}
