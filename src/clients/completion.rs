//! # Completion Client
//!
//! Chat-completion requests against an OpenAI-compatible endpoint. API keys
//! are tried in a shared round-robin order; when every key fails the prompt
//! is answered by the search fallback instead.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::search::SearchClient;
use crate::config::CompletionConfig;
use crate::errors::BotError;

/// Masks an API key for safe logging: first 7 chars + "***" + last 4 chars.
/// Keys of 11 chars or fewer are fully masked.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

/// Rotating pool of completion API keys
///
/// The index is shared by every request of the process: a failing key moves
/// the index forward for all later calls, and a success leaves it in place.
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: Vec<String>,
    index: AtomicUsize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            index: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Key at the current index
    pub fn current(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        self.keys
            .get(self.current_index() % self.keys.len())
            .map(String::as_str)
    }

    /// Move to the next key, wrapping around
    pub fn advance(&self) {
        let len = self.keys.len().max(1);
        // fetch_update only fails when the closure returns None
        let _ = self
            .index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len));
    }

    pub fn reset(&self) {
        self.index.store(0, Ordering::SeqCst);
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    config: CompletionConfig,
    keys: Arc<KeyRing>,
    search: SearchClient,
}

impl CompletionClient {
    pub fn new(
        http: reqwest::Client,
        url: &str,
        config: CompletionConfig,
        keys: Arc<KeyRing>,
        search: SearchClient,
    ) -> Self {
        Self {
            http,
            url: url.to_string(),
            config,
            keys,
            search,
        }
    }

    pub fn key_ring(&self) -> &Arc<KeyRing> {
        &self.keys
    }

    /// Reply to `prompt` in the configured persona
    ///
    /// Tries each key once starting at the shared index. When all of them
    /// fail, returns the search fallback's answer for the same prompt.
    pub async fn complete(&self, prompt: &str) -> String {
        for attempt in 0..self.keys.len() {
            let Some(key) = self.keys.current() else {
                break;
            };

            match self.request(key, prompt).await {
                Ok(reply) => {
                    debug!(attempt, api_key = %mask_token(key), "Completion succeeded");
                    return reply;
                }
                Err(e) => {
                    warn!(
                        attempt,
                        api_key = %mask_token(key),
                        error = %e,
                        "Completion failed, rotating to next key"
                    );
                    self.keys.advance();
                }
            }
        }

        info!(keys = self.keys.len(), "All completion keys failed, using search fallback");
        self.search.answer(prompt).await
    }

    async fn request(&self, key: &str, prompt: &str) -> Result<String, BotError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.persona,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Upstream(format!("completion returned status {status}")));
        }

        let payload: ChatResponse = response.json().await?;
        if let Some(error) = payload.error {
            return Err(BotError::Upstream(
                error.message.unwrap_or_else(|| "unknown completion error".to_string()),
            ));
        }

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| BotError::Upstream("completion returned no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("sk-abcdefghijklmnop"), "sk-abcd***mnop");
    }

    #[test]
    fn test_key_ring_wraps_around() {
        let ring = KeyRing::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(ring.current(), Some("a"));
        ring.advance();
        ring.advance();
        assert_eq!(ring.current(), Some("c"));
        ring.advance();
        assert_eq!(ring.current_index(), 0);
        assert_eq!(ring.current(), Some("a"));
    }

    #[test]
    fn test_empty_key_ring() {
        let ring = KeyRing::new(Vec::new());
        assert!(ring.is_empty());
        assert_eq!(ring.current(), None);
        ring.advance();
        assert_eq!(ring.current_index(), 0);
    }
}
