//! Shared fixtures for integration tests: configuration pointed at a mock
//! server, a recording messenger and canned upstream responses.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use teloxide::types::ReplyMarkup;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopbuddy::bot::{HandlerSettings, WebhookHandler};
use shopbuddy::clients::{ExternalClients, Messenger};
use shopbuddy::config::{ApiEndpoints, BotConfig, CompletionConfig, CooldownConfig};
use shopbuddy::cooldown::CooldownGate;
use shopbuddy::errors::BotError;
use shopbuddy::user_store::JsonFileStore;

pub const COMPLETION_PATH: &str = "/v1/chat/completions";
pub const SEARCH_PATH: &str = "/search";
pub const CURRENCY_PATH: &str = "/convert";
pub const GEOCODE_PATH: &str = "/reverse";

/// Configuration whose every endpoint lives on `server`
pub fn config_for(server: &MockServer, keys: &[&str], store_path: &Path) -> BotConfig {
    let uri = server.uri();
    BotConfig {
        telegram_token: "test_bot_token_12345".to_string(),
        api_keys: keys.iter().map(|key| key.to_string()).collect(),
        store_path: store_path.to_path_buf(),
        bind_addr: "127.0.0.1:0".to_string(),
        default_timezone: "Asia/Kolkata".to_string(),
        scratch_ttl_secs: 60,
        endpoints: ApiEndpoints {
            completion_url: format!("{uri}{COMPLETION_PATH}"),
            search_url: format!("{uri}{SEARCH_PATH}"),
            currency_url: format!("{uri}{CURRENCY_PATH}"),
            geocode_url: format!("{uri}{GEOCODE_PATH}"),
        },
        completion: CompletionConfig::default(),
        cooldown: CooldownConfig {
            interval_secs: 120,
            reply_chance: 0.0,
        },
    }
}

/// A message captured by [`RecordingMessenger`]
#[derive(Debug, Clone)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Photo {
        chat_id: i64,
        url: String,
        caption: String,
    },
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Text { text, .. } => text,
            Sent::Photo { caption, .. } => caption,
        }
    }
}

/// Messenger that records instead of sending
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Telegram("Bad Request: chat not found".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            markup,
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        image_url: &str,
        caption: &str,
    ) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Telegram("Bad Request: chat not found".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Photo {
            chat_id,
            url: image_url.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }
}

/// Handler wired to the mock server, a JSON store at `store_path` and `messenger`
pub fn build_handler(
    config: &BotConfig,
    messenger: Arc<RecordingMessenger>,
) -> (WebhookHandler, Arc<CooldownGate>) {
    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let clients = ExternalClients::from_config(config).unwrap();
    let cooldown = Arc::new(CooldownGate::new(&config.cooldown));
    let handler = WebhookHandler::new(
        store,
        messenger,
        clients,
        Arc::clone(&cooldown),
        HandlerSettings::from_config(config),
    );
    (handler, cooldown)
}

/// Chat-completion body with a single choice
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

/// Every completion request answers `content`
pub async fn mock_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path(COMPLETION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Instant-answer body from (text, url) pairs
pub fn search_body(topics: &[(Option<&str>, Option<&str>)]) -> serde_json::Value {
    let related: Vec<serde_json::Value> = topics
        .iter()
        .map(|(text, url)| {
            let mut topic = serde_json::Map::new();
            if let Some(text) = text {
                topic.insert("Text".to_string(), json!(text));
            }
            if let Some(url) = url {
                topic.insert("FirstURL".to_string(), json!(url));
            }
            serde_json::Value::Object(topic)
        })
        .collect();
    json!({ "Abstract": "", "RelatedTopics": related })
}

/// Search for `query` answers the given topics
pub async fn mock_search(server: &MockServer, query: &str, topics: &[(Option<&str>, Option<&str>)]) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(topics)))
        .mount(server)
        .await;
}
