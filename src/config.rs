//! # Configuration Module
//!
//! This module defines configuration structures for the webhook bot:
//! upstream endpoints, completion parameters, group reply throttling and
//! process-level settings read from the environment.

use std::env;
use std::path::PathBuf;

use crate::errors::BotError;

// Constants for bot configuration
pub const DEFAULT_STORE_PATH: &str = "users.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com/";
pub const DEFAULT_CURRENCY_URL: &str = "https://api.exchangerate.host/convert";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const GROUP_COOLDOWN_SECS: u64 = 120; // 2 minutes between unsolicited group replies
pub const GROUP_REPLY_CHANCE: f64 = 0.2;
pub const SCRATCH_TTL_SECS: i64 = 60;

/// Persona sent as the system message of every completion request
pub const PERSONA: &str = "You are ShopBuddy, a cheerful shopping assistant living in Telegram. \
Keep answers short, friendly and practical, and suggest products when it fits the conversation.";

/// Base URLs of every upstream HTTP API
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    /// Chat-completion endpoint (OpenAI compatible)
    pub completion_url: String,
    /// Instant-answer search endpoint
    pub search_url: String,
    /// Currency conversion endpoint
    pub currency_url: String,
    /// Reverse geocoding endpoint
    pub geocode_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            currency_url: DEFAULT_CURRENCY_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
        }
    }
}

/// Parameters of a completion request
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model name
    pub model: String,
    /// System persona
    pub persona: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Token cap for a reply
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            persona: PERSONA.to_string(),
            temperature: 0.7,
            max_tokens: 300,
        }
    }
}

/// Throttling of unsolicited replies in group chats
#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Minimum seconds between two allowed replies in the same chat
    pub interval_secs: u64,
    /// Probability that a group message is considered for a reply at all
    pub reply_chance: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            interval_secs: GROUP_COOLDOWN_SECS,
            reply_chance: GROUP_REPLY_CHANCE,
        }
    }
}

/// Complete process configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub telegram_token: String,
    /// Completion API keys in rotation order
    pub api_keys: Vec<String>,
    /// Location of the profile JSON document
    pub store_path: PathBuf,
    /// Address the webhook server listens on
    pub bind_addr: String,
    /// Timezone assumed when a user never shared a location
    pub default_timezone: String,
    /// Lifetime of downloaded photo scratch files in seconds
    pub scratch_ttl_secs: i64,
    pub endpoints: ApiEndpoints,
    pub completion: CompletionConfig,
    pub cooldown: CooldownConfig,
}

impl BotConfig {
    /// Build the configuration from process environment variables
    ///
    /// Only `TELEGRAM_BOT_TOKEN` is required; every other setting falls back
    /// to the constants of this module.
    pub fn from_env() -> Result<Self, BotError> {
        let telegram_token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| BotError::Config("TELEGRAM_BOT_TOKEN must be set".to_string()))?;

        let api_keys = parse_api_keys(&env::var("API_KEYS").unwrap_or_default());

        let defaults = ApiEndpoints::default();
        let endpoints = ApiEndpoints {
            completion_url: env_or("COMPLETION_URL", &defaults.completion_url),
            search_url: env_or("SEARCH_URL", &defaults.search_url),
            currency_url: env_or("CURRENCY_URL", &defaults.currency_url),
            geocode_url: env_or("GEOCODE_URL", &defaults.geocode_url),
        };

        let completion = CompletionConfig {
            model: env_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            ..Default::default()
        };

        let cooldown = CooldownConfig {
            interval_secs: parse_env("GROUP_COOLDOWN_SECS", GROUP_COOLDOWN_SECS)?,
            reply_chance: parse_env("GROUP_REPLY_CHANCE", GROUP_REPLY_CHANCE)?,
        };
        if !(0.0..=1.0).contains(&cooldown.reply_chance) {
            return Err(BotError::Config(format!(
                "GROUP_REPLY_CHANCE must be within 0..=1, got {}",
                cooldown.reply_chance
            )));
        }

        Ok(Self {
            telegram_token,
            api_keys,
            store_path: PathBuf::from(env_or("USER_STORE_PATH", DEFAULT_STORE_PATH)),
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            default_timezone: env_or("DEFAULT_TIMEZONE", DEFAULT_TIMEZONE),
            scratch_ttl_secs: parse_env("SCRATCH_TTL_SECS", SCRATCH_TTL_SECS)?,
            endpoints,
            completion,
            cooldown,
        })
    }
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BotError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{name} has an invalid value: {value}"))),
        _ => Ok(default),
    }
}
