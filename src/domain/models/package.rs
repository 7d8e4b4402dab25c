use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    OneTime,
    Subscription,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::OneTime => "one_time",
            PackageType::Subscription => "subscription",
        }
    }
}

impl TryFrom<String> for PackageType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "one_time" => Ok(PackageType::OneTime),
            "subscription" => Ok(PackageType::Subscription),
            other => Err(AppError::Validation(format!("Unknown package type '{}'", other))),
        }
    }
}

/// Upper bound for both `num_readings` and `subscription_days` (one hundred years of days).
pub const MAX_PACKAGE_AMOUNT: i64 = 36_500;

/// What buying a package does to the buyer's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageEffect {
    OneTime { num_readings: i64 },
    Subscription { days: i64 },
}

impl PackageEffect {
    pub fn new(package_type: PackageType, num_readings: Option<i64>, subscription_days: Option<i64>) -> Result<Self, AppError> {
        match package_type {
            PackageType::OneTime => match num_readings {
                Some(n) if n > MAX_PACKAGE_AMOUNT => Err(AppError::Validation(
                    format!("num_readings must be at most {}", MAX_PACKAGE_AMOUNT),
                )),
                Some(n) if n > 0 => Ok(PackageEffect::OneTime { num_readings: n }),
                _ => Err(AppError::Validation("One-time packages need a positive num_readings".into())),
            },
            PackageType::Subscription => match subscription_days {
                Some(d) if d > MAX_PACKAGE_AMOUNT => Err(AppError::Validation(
                    format!("subscription_days must be at most {}", MAX_PACKAGE_AMOUNT),
                )),
                Some(d) if d > 0 => Ok(PackageEffect::Subscription { days: d }),
                _ => Err(AppError::Validation("Subscription packages need a positive subscription_days".into())),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Package {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub package_type: PackageType,
    /// Minor currency units.
    pub price: i64,
    pub num_readings: Option<i64>,
    pub subscription_days: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn new(project_id: String, name: String, price: i64, effect: PackageEffect) -> Self {
        let now = Utc::now();
        let (package_type, num_readings, subscription_days) = match effect {
            PackageEffect::OneTime { num_readings } => (PackageType::OneTime, Some(num_readings), None),
            PackageEffect::Subscription { days } => (PackageType::Subscription, None, Some(days)),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            name,
            package_type,
            price,
            num_readings,
            subscription_days,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn effect(&self) -> Result<PackageEffect, AppError> {
        PackageEffect::new(self.package_type, self.num_readings, self.subscription_days)
    }

    pub fn display_price(&self) -> String {
        format!("{}.{:02}", self.price / 100, self.price % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_requires_matching_amount() {
        assert_eq!(
            PackageEffect::new(PackageType::OneTime, Some(5), None).unwrap(),
            PackageEffect::OneTime { num_readings: 5 }
        );
        assert!(PackageEffect::new(PackageType::OneTime, None, Some(30)).is_err());
        assert!(PackageEffect::new(PackageType::Subscription, Some(5), None).is_err());
        assert!(PackageEffect::new(PackageType::Subscription, None, Some(0)).is_err());
    }

    #[test]
    fn test_effect_rejects_oversized_amounts() {
        assert_eq!(
            PackageEffect::new(PackageType::Subscription, None, Some(MAX_PACKAGE_AMOUNT)).unwrap(),
            PackageEffect::Subscription { days: MAX_PACKAGE_AMOUNT }
        );
        let err = PackageEffect::new(PackageType::Subscription, None, Some(1_000_000_000)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("subscription_days")));
        assert!(PackageEffect::new(PackageType::Subscription, None, Some(i64::MAX)).is_err());
        assert!(PackageEffect::new(PackageType::OneTime, Some(MAX_PACKAGE_AMOUNT + 1), None).is_err());
    }

    #[test]
    fn test_package_round_trips_its_effect() {
        let package = Package::new("p1".into(), "Month".into(), 49900, PackageEffect::Subscription { days: 30 });
        assert_eq!(package.package_type, PackageType::Subscription);
        assert_eq!(package.effect().unwrap(), PackageEffect::Subscription { days: 30 });
        assert_eq!(package.display_price(), "499.00");
    }
}
