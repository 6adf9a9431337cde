//! Webhook Handler module for processing incoming Telegram updates
//!
//! One update is handled end-to-end: the chat's profile is loaded, first
//! contact triggers onboarding, later updates enrich the profile and are
//! answered through exactly one route of the [`ROUTES`] table. A shared
//! location is confirmed on its own, whichever route then answers.

use anyhow::Result;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{currency, ExternalClients, Messenger};
use crate::config::BotConfig;
use crate::cooldown::CooldownGate;
use crate::localization::{t, t_args};
use crate::mood::{detect_mood, fetch_quote_or_image, DynamicContent};
use crate::products::{is_category, is_product_query, search_products};
use crate::user_store::{ProfilePatch, ProfileStore, UserProfile};

use super::ui_builder::{category_keyboard, format_product_list, location_request_keyboard};
use super::update::{ChatEvent, WebhookUpdate};

/// Reply paths, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRoute {
    /// Unsolicited mood-based reply in a group chat
    GroupMood,
    /// Category button pressed
    CategoryBrowse,
    /// Shopping question
    ProductQuery,
    /// Anything else goes to the language model
    Conversation,
}

/// Branch table evaluated top to bottom; the first matching guard wins
pub const ROUTES: [ReplyRoute; 4] = [
    ReplyRoute::GroupMood,
    ReplyRoute::CategoryBrowse,
    ReplyRoute::ProductQuery,
    ReplyRoute::Conversation,
];

/// What happened to an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Nothing the bot understands
    Ignored,
    /// First contact, onboarding prompts sent
    Onboarded,
    Replied(ReplyRoute),
}

/// Tunables of the handler
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Probability that a group message is considered for a mood reply
    pub group_reply_chance: f64,
    /// Timezone assumed for currency when no location was ever shared
    pub default_timezone: String,
}

impl HandlerSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            group_reply_chance: config.cooldown.reply_chance,
            default_timezone: config.default_timezone.clone(),
        }
    }
}

pub struct WebhookHandler {
    store: Arc<dyn ProfileStore>,
    messenger: Arc<dyn Messenger>,
    clients: ExternalClients,
    cooldown: Arc<CooldownGate>,
    settings: HandlerSettings,
}

impl WebhookHandler {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        messenger: Arc<dyn Messenger>,
        clients: ExternalClients,
        cooldown: Arc<CooldownGate>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            store,
            messenger,
            clients,
            cooldown,
            settings,
        }
    }

    /// Handle one inbound update
    pub async fn handle_update(&self, update: WebhookUpdate) -> Result<HandleOutcome> {
        let Some(event) = update.into_event() else {
            debug!("Update carries neither a message nor a callback");
            return Ok(HandleOutcome::Ignored);
        };

        let profile = self.store.get(event.chat_id).await;
        if !profile.initialized {
            self.onboard(event.chat_id).await?;
            return Ok(HandleOutcome::Onboarded);
        }

        let profile = self.enrich_profile(&event, profile).await;
        if event.location.is_some() {
            self.acknowledge_location(event.chat_id, &profile).await?;
        }

        let route = self.select_route(&event);
        info!(chat_id = %event.chat_id, route = ?route, "Dispatching update");
        self.reply(route, &event, &profile).await?;

        Ok(HandleOutcome::Replied(route))
    }

    /// Send the three onboarding prompts and mark the profile initialized
    async fn onboard(&self, chat_id: i64) -> Result<()> {
        info!(chat_id = %chat_id, "First contact, sending onboarding prompts");

        self.messenger
            .send_text(chat_id, &t("prompt-location"), Some(location_request_keyboard()))
            .await?;
        self.messenger
            .send_text(chat_id, &t("prompt-nickname"), None)
            .await?;
        self.messenger
            .send_text(chat_id, &t("prompt-category"), Some(category_keyboard()))
            .await?;

        self.store
            .update(
                chat_id,
                ProfilePatch {
                    initialized: Some(true),
                    ..Default::default()
                },
            )
            .await;
        Ok(())
    }

    /// Store what this update teaches about the user; returns the current profile
    async fn enrich_profile(&self, event: &ChatEvent, profile: UserProfile) -> UserProfile {
        let mut patch = ProfilePatch::default();

        if let Some(location) = event.location {
            let currency = self
                .clients
                .currency
                .currency_from_location(location.latitude, location.longitude)
                .await;
            patch.location = Some(location);
            patch.currency = Some(currency);
        } else if profile.currency.is_none() {
            let currency = currency::currency_from_timezone(&self.settings.default_timezone);
            patch.currency = Some(currency.to_string());
        }

        if !event.text.is_empty() && profile.nickname.is_none() {
            patch.nickname = Some(event.text.clone());
        }

        if is_category(&event.text) && profile.category.is_none() {
            patch.category = Some(event.text.clone());
        }

        if patch.is_empty() {
            return profile;
        }

        debug!(chat_id = %event.chat_id, patch = ?patch, "Enriching profile");
        self.store.update(event.chat_id, patch).await
    }

    async fn acknowledge_location(&self, chat_id: i64, profile: &UserProfile) -> Result<()> {
        let text = t_args("location-saved", &[("currency", profile.currency_or_default())]);
        self.messenger.send_text(chat_id, &text, None).await?;
        Ok(())
    }

    /// First route of [`ROUTES`] whose guard holds
    ///
    /// The group guard rolls the dice before touching the cooldown gate, so
    /// a failed roll never consumes the chat's reply slot.
    pub fn select_route(&self, event: &ChatEvent) -> ReplyRoute {
        ROUTES
            .into_iter()
            .find(|route| self.guard(*route, event))
            .unwrap_or(ReplyRoute::Conversation)
    }

    fn guard(&self, route: ReplyRoute, event: &ChatEvent) -> bool {
        match route {
            ReplyRoute::GroupMood => {
                event.is_group()
                    && rand::thread_rng().gen_bool(self.settings.group_reply_chance)
                    && self.cooldown.try_acquire(event.chat_id)
            }
            ReplyRoute::CategoryBrowse => is_category(&event.text),
            ReplyRoute::ProductQuery => is_product_query(&event.text),
            ReplyRoute::Conversation => true,
        }
    }

    async fn reply(&self, route: ReplyRoute, event: &ChatEvent, profile: &UserProfile) -> Result<()> {
        match route {
            ReplyRoute::GroupMood => {
                let mood = detect_mood(&self.clients.completion, &event.text).await;
                match fetch_quote_or_image(&self.clients.search, &mood).await {
                    DynamicContent::Image { url, caption } => {
                        self.messenger.send_photo(event.chat_id, &url, &caption).await?;
                    }
                    DynamicContent::Text(text) => {
                        self.messenger.send_text(event.chat_id, &text, None).await?;
                    }
                }
            }
            ReplyRoute::CategoryBrowse | ReplyRoute::ProductQuery => {
                self.send_products(event, profile).await?;
            }
            ReplyRoute::Conversation => {
                let nickname = profile
                    .nickname
                    .clone()
                    .unwrap_or_else(|| t("default-nickname"));
                let reply = self
                    .clients
                    .completion
                    .complete(&conversation_prompt(&nickname, &event.text))
                    .await;
                self.messenger
                    .send_text(event.chat_id, &reply, Some(category_keyboard()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_products(&self, event: &ChatEvent, profile: &UserProfile) -> Result<()> {
        let products = search_products(
            &self.clients.search,
            &self.clients.currency,
            &event.text,
            profile.currency_or_default(),
        )
        .await;

        let text = if products.is_empty() {
            t("products-none")
        } else {
            format_product_list(&event.text, &products)
        };
        self.messenger.send_text(event.chat_id, &text, None).await?;
        Ok(())
    }
}

/// Prompt for a free-text reply naming the user
pub fn conversation_prompt(nickname: &str, text: &str) -> String {
    format!(
        "You are chatting with {nickname}. Reply to them in a warm, playful tone \
         and keep it brief.\n\n{nickname} says: {text}"
    )
}
