pub mod bot;
pub mod draw;
pub mod interpretation_provider;
pub mod ledger;
pub mod reading_service;
pub mod settlement;
