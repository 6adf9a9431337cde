//! # Error Types Module
//!
//! This module defines the error taxonomy shared by the webhook handler,
//! the external API clients and the profile store.

/// Custom error types for the bot
#[derive(Debug, Clone)]
pub enum BotError {
    /// Missing or invalid process configuration
    Config(String),
    /// Non-success status or error payload from an upstream API
    Upstream(String),
    /// Profile store read/write failures
    Storage(String),
    /// Messaging platform send failures
    Telegram(String),
    /// Inbound payload that cannot be interpreted
    Payload(String),
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BotError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            BotError::Storage(msg) => write!(f, "Storage error: {msg}"),
            BotError::Telegram(msg) => write!(f, "Telegram error: {msg}"),
            BotError::Payload(msg) => write!(f, "Payload error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Upstream(err.to_string())
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::Telegram(err.to_string())
    }
}
