use std::sync::Arc;
use chrono::{Duration, NaiveDate, Utc};
use tracing::info;
use crate::domain::models::{package::{PackageEffect, MAX_PACKAGE_AMOUNT}, user::User};
use crate::domain::ports::UserRepository;
use crate::error::AppError;

pub fn has_credit(user: &User) -> bool {
    user.balance > 0
}

pub fn is_subscription_active(user: &User, as_of: NaiveDate) -> bool {
    match (user.subscription_start, user.subscription_end) {
        (Some(_), Some(end)) => as_of <= end,
        _ => false,
    }
}

/// A subscription window starting `today`. Replaces any previous window.
pub fn subscription_window(today: NaiveDate, days: i64) -> Result<(NaiveDate, NaiveDate), AppError> {
    let end = Duration::try_days(days)
        .and_then(|length| today.checked_add_signed(length))
        .ok_or_else(|| AppError::Validation("Subscription length out of range".into()))?;
    Ok((today, end))
}

/// A ledger mutation waiting to be applied to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementChange {
    Credit { user_id: String, readings: i64 },
    Subscription { user_id: String, start: NaiveDate, end: NaiveDate },
}

impl EntitlementChange {
    pub fn for_package(user_id: &str, effect: PackageEffect, today: NaiveDate) -> Result<Self, AppError> {
        match effect {
            PackageEffect::OneTime { num_readings } => Ok(EntitlementChange::Credit {
                user_id: user_id.to_string(),
                readings: num_readings,
            }),
            PackageEffect::Subscription { days } => {
                let (start, end) = subscription_window(today, days)?;
                Ok(EntitlementChange::Subscription { user_id: user_id.to_string(), start, end })
            }
        }
    }
}

/// Standalone ledger operations for admin grants and direct adjustments. Each call is its
/// own storage operation. Settlement and readings do not go through here: they apply an
/// `EntitlementChange` or a debit inside the payment or reading transaction so the ledger
/// and the record it pays for commit together.
pub struct EntitlementLedger {
    users: Arc<dyn UserRepository>,
}

impl EntitlementLedger {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Takes one reading. The check and the decrement are a single storage operation.
    pub async fn debit(&self, user_id: &str) -> Result<i64, AppError> {
        match self.users.debit_if_positive(user_id).await? {
            Some(balance) => {
                info!("Debited one reading from user {}, balance now {}", user_id, balance);
                Ok(balance)
            }
            None => match self.users.find_by_id(user_id).await? {
                Some(_) => Err(AppError::InsufficientBalance),
                None => Err(AppError::NotFound("User not found".into())),
            },
        }
    }

    pub async fn credit_one_time(&self, user_id: &str, amount: i64) -> Result<User, AppError> {
        if amount <= 0 {
            return Err(AppError::Validation("Credit amount must be positive".into()));
        }
        if amount > MAX_PACKAGE_AMOUNT {
            return Err(AppError::Validation(format!("Credit amount must be at most {}", MAX_PACKAGE_AMOUNT)));
        }
        let user = self.users.credit(user_id, amount).await?;
        info!("Credited {} readings to user {}, balance now {}", amount, user_id, user.balance);
        Ok(user)
    }

    pub async fn apply_subscription(&self, user_id: &str, days: i64) -> Result<User, AppError> {
        if days <= 0 || days > MAX_PACKAGE_AMOUNT {
            return Err(AppError::Validation(format!("Subscription length must be between 1 and {} days", MAX_PACKAGE_AMOUNT)));
        }
        let (start, end) = subscription_window(Utc::now().date_naive(), days)?;
        self.users.set_subscription(user_id, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(balance: i64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> User {
        let mut user = User::new("p".into(), 1, None, balance);
        user.subscription_start = start;
        user.subscription_end = end;
        user
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_has_credit() {
        assert!(has_credit(&user_with(1, None, None)));
        assert!(!has_credit(&user_with(0, None, None)));
    }

    #[test]
    fn test_subscription_active_until_end_inclusive() {
        let user = user_with(0, Some(date(2025, 1, 1)), Some(date(2025, 1, 31)));
        assert!(is_subscription_active(&user, date(2025, 1, 15)));
        assert!(is_subscription_active(&user, date(2025, 1, 31)));
        assert!(!is_subscription_active(&user, date(2025, 2, 1)));
    }

    #[test]
    fn test_subscription_needs_both_dates() {
        assert!(!is_subscription_active(&user_with(0, None, Some(date(2030, 1, 1))), date(2025, 1, 1)));
        assert!(!is_subscription_active(&user_with(0, Some(date(2025, 1, 1)), None), date(2025, 1, 1)));
    }

    #[test]
    fn test_package_changes() {
        let today = date(2025, 3, 10);
        assert_eq!(
            EntitlementChange::for_package("u", PackageEffect::OneTime { num_readings: 5 }, today).unwrap(),
            EntitlementChange::Credit { user_id: "u".into(), readings: 5 }
        );
        assert_eq!(
            EntitlementChange::for_package("u", PackageEffect::Subscription { days: 30 }, today).unwrap(),
            EntitlementChange::Subscription { user_id: "u".into(), start: today, end: date(2025, 4, 9) }
        );
    }

    #[test]
    fn test_window_out_of_range_is_an_error() {
        let today = date(2025, 3, 10);
        assert!(matches!(subscription_window(today, 1_000_000_000), Err(AppError::Validation(_))));
        assert!(matches!(subscription_window(today, i64::MAX), Err(AppError::Validation(_))));
        assert!(EntitlementChange::for_package("u", PackageEffect::Subscription { days: i64::MAX }, today).is_err());
        assert!(subscription_window(today, MAX_PACKAGE_AMOUNT).is_ok());
    }
}
