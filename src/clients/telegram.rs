//! Outbound messaging
//!
//! The [`Messenger`] trait is the seam between the webhook handler and the
//! Telegram Bot API; [`TelegramMessenger`] implements it with teloxide.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, ReplyMarkup};
use teloxide::ApiError;
use teloxide::RequestError;
use tracing::{debug, warn};

use crate::errors::BotError;
use crate::expiring_files::ExpiringFiles;

/// Sends messages to a chat
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send Markdown text, optionally with a keyboard
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError>;

    /// Send an image by URL with a caption
    async fn send_photo(&self, chat_id: i64, image_url: &str, caption: &str)
        -> Result<(), BotError>;
}

pub struct TelegramMessenger {
    bot: Bot,
    http: reqwest::Client,
    scratch: Arc<ExpiringFiles>,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, http: reqwest::Client, scratch: Arc<ExpiringFiles>) -> Self {
        Self { bot, http, scratch }
    }

    /// Download an image into a scratch file that expires later
    async fn download_image(&self, image_url: &str) -> anyhow::Result<PathBuf> {
        let bytes = self
            .http
            .get(image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("shopbuddy-")
            .suffix(".jpg")
            .tempfile()?;
        temp_file.as_file_mut().write_all(&bytes)?;
        let (_, path) = temp_file.keep()?;

        self.scratch.register(&path);
        Ok(path)
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    #[allow(deprecated)]
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown);
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::CantParseEntities(reason))) => {
                // Unbalanced entities in generated text; resend without formatting
                debug!(chat_id, reason = %reason, "Markdown rejected, sending plain text");
                let mut plain = self.bot.send_message(ChatId(chat_id), text);
                if let Some(markup) = markup {
                    plain = plain.reply_markup(markup);
                }
                plain.await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        image_url: &str,
        caption: &str,
    ) -> Result<(), BotError> {
        let photo = match self.download_image(image_url).await {
            Ok(path) => InputFile::file(path),
            Err(e) => {
                warn!(chat_id, error = %e, "Image download failed, passing URL to Telegram");
                let url = reqwest::Url::parse(image_url)
                    .map_err(|e| BotError::Payload(format!("invalid image URL {image_url}: {e}")))?;
                InputFile::url(url)
            }
        };

        self.bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .await?;
        Ok(())
    }
}
