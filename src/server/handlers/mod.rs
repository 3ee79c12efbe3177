pub mod chat;
pub mod config;
pub mod documents;
pub mod health;
pub mod sessions;
