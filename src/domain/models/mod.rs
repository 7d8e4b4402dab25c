pub mod project;
pub mod deck;
pub mod spread;
pub mod user;
pub mod interpretation;
pub mod package;
pub mod payment;
