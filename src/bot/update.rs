//! Inbound webhook payloads
//!
//! Only the handful of update fields the bot reads are modelled; everything
//! else in a Telegram update is ignored during deserialization.

use serde::Deserialize;

use crate::user_store::Location;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookUpdate {
    pub message: Option<IncomingMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub message: Option<IncomingMessage>,
    pub data: Option<String>,
}

/// The part of an update the handler acts on
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub chat_type: String,
    /// Message text, or the callback data for button presses
    pub text: String,
    pub location: Option<Location>,
}

impl ChatEvent {
    pub fn is_group(&self) -> bool {
        self.chat_type == "group"
    }
}

impl WebhookUpdate {
    /// Extract the chat event, preferring a message over a callback query
    pub fn into_event(self) -> Option<ChatEvent> {
        if let Some(message) = self.message {
            return Some(ChatEvent {
                chat_id: message.chat.id,
                chat_type: message.chat.kind,
                text: message.text.unwrap_or_default(),
                location: message.location,
            });
        }

        let callback = self.callback_query?;
        let message = callback.message?;
        Some(ChatEvent {
            chat_id: message.chat.id,
            chat_type: message.chat.kind,
            text: callback.data.unwrap_or_default(),
            location: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<ChatEvent> {
        serde_json::from_str::<WebhookUpdate>(json)
            .unwrap()
            .into_event()
    }

    #[test]
    fn test_text_message() {
        let event = parse(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":1,"type":"private"},"text":"Hello"}}"#,
        )
        .unwrap();
        assert_eq!(event.chat_id, 1);
        assert_eq!(event.text, "Hello");
        assert!(!event.is_group());
    }

    #[test]
    fn test_location_message() {
        let event = parse(
            r#"{"message":{"chat":{"id":-100,"type":"group"},"location":{"latitude":48.85,"longitude":2.35}}}"#,
        )
        .unwrap();
        assert!(event.is_group());
        assert!(event.text.is_empty());
        assert_eq!(
            event.location,
            Some(Location {
                latitude: 48.85,
                longitude: 2.35
            })
        );
    }

    #[test]
    fn test_callback_data_becomes_text() {
        let event = parse(
            r#"{"callback_query":{"id":"9","data":"Books","message":{"chat":{"id":3,"type":"private"}}}}"#,
        )
        .unwrap();
        assert_eq!(event.chat_id, 3);
        assert_eq!(event.text, "Books");
    }

    #[test]
    fn test_unrecognized_payloads() {
        assert!(parse(r#"{"update_id":1}"#).is_none());
        assert!(parse(r#"{"callback_query":{"id":"1","data":"Books"}}"#).is_none());
    }
}
