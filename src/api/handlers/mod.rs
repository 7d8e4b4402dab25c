pub mod bot;
pub mod catalog;
pub mod health;
pub mod package;
pub mod payment;
pub mod project;
pub mod reading;
pub mod user;
