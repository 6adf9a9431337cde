//! External API clients
//!
//! This module groups the thin request/response wrappers around every
//! upstream service the bot talks to:
//! - `completion`: language-model replies with API-key rotation
//! - `search`: instant-answer lookups used as a fallback and for products
//! - `currency`: conversion and location/timezone to currency resolution
//! - `telegram`: outbound messages to the messaging platform

pub mod completion;
pub mod currency;
pub mod search;
pub mod telegram;

use std::sync::Arc;

use crate::config::BotConfig;
use crate::errors::BotError;

pub use completion::{CompletionClient, KeyRing};
pub use currency::CurrencyClient;
pub use search::{RelatedTopic, SearchClient};
pub use telegram::{Messenger, TelegramMessenger};

/// User agent sent to public APIs that require one (geocoding)
pub const USER_AGENT: &str = concat!("shopbuddy/", env!("CARGO_PKG_VERSION"));

/// The HTTP clients used by the webhook handler
#[derive(Clone)]
pub struct ExternalClients {
    pub completion: CompletionClient,
    pub search: SearchClient,
    pub currency: CurrencyClient,
}

impl ExternalClients {
    /// Build every client from the configuration with a fresh key ring
    pub fn from_config(config: &BotConfig) -> Result<Self, BotError> {
        let key_ring = Arc::new(KeyRing::new(config.api_keys.clone()));
        Self::with_key_ring(config, key_ring)
    }

    /// Build every client around an existing key ring
    pub fn with_key_ring(config: &BotConfig, key_ring: Arc<KeyRing>) -> Result<Self, BotError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        let search = SearchClient::new(http.clone(), &config.endpoints.search_url);
        let currency = CurrencyClient::new(
            http.clone(),
            &config.endpoints.currency_url,
            &config.endpoints.geocode_url,
        );
        let completion = CompletionClient::new(
            http,
            &config.endpoints.completion_url,
            config.completion.clone(),
            key_ring,
            search.clone(),
        );

        Ok(Self {
            completion,
            search,
            currency,
        })
    }
}
