//! # Mood Module
//!
//! One-word mood detection through the completion client, and a
//! mood-appropriate quote or image found through the search fallback.

use tracing::{debug, warn};

use crate::clients::{CompletionClient, SearchClient};
use crate::localization::t_args;

/// Moods the analysis prompt asks for
pub const MOODS: [&str; 4] = ["happy", "sad", "angry", "neutral"];

/// Something to send in reaction to a mood
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicContent {
    Image { url: String, caption: String },
    Text(String),
}

/// Prompt asking the model for a single mood word
pub fn mood_prompt(text: &str) -> String {
    format!(
        "Analyze the mood of the following message and answer with exactly one word \
         from this list: {}.\n\nMessage: \"{}\"",
        MOODS.join(", "),
        text
    )
}

/// Mood of `text` as answered by the model, lower-cased and trimmed.
/// The answer is not checked against [`MOODS`].
pub async fn detect_mood(completion: &CompletionClient, text: &str) -> String {
    let mood = completion.complete(&mood_prompt(text)).await.trim().to_lowercase();
    debug!(mood = %mood, "Mood detected");
    mood
}

/// Quote or image for `mood`, based on the first search entry only
pub async fn fetch_quote_or_image(search: &SearchClient, mood: &str) -> DynamicContent {
    let query = format!("{mood} quote");
    let first = match search.first_topic(&query).await {
        Ok(topic) => topic,
        Err(e) => {
            warn!(mood = %mood, error = %e, "Mood content search failed");
            None
        }
    };

    match first {
        Some(topic) => match (topic.first_url, topic.text) {
            (Some(url), text) => DynamicContent::Image {
                url,
                caption: text.unwrap_or_else(|| t_args("mood-photo-caption", &[("mood", mood)])),
            },
            (None, Some(text)) => DynamicContent::Text(text),
            (None, None) => DynamicContent::Text(t_args("mood-generic", &[("mood", mood)])),
        },
        None => DynamicContent::Text(t_args("mood-generic", &[("mood", mood)])),
    }
}
