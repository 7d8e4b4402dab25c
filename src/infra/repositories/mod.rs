pub mod sqlite_project_repo;
pub mod sqlite_user_repo;
pub mod sqlite_deck_repo;
pub mod sqlite_spread_repo;
pub mod sqlite_interpretation_repo;
pub mod sqlite_package_repo;
pub mod sqlite_payment_repo;

pub mod postgres_project_repo;
pub mod postgres_user_repo;
pub mod postgres_deck_repo;
pub mod postgres_spread_repo;
pub mod postgres_interpretation_repo;
pub mod postgres_package_repo;
pub mod postgres_payment_repo;
