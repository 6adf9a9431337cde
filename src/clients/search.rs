//! Instant-answer search client
//!
//! Used as the generic fallback when every completion key fails, and as the
//! data source for product and mood-content lookups.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::BotError;
use crate::localization::t;

/// Number of entries joined into a generic fallback answer
pub const ANSWER_RESULTS: usize = 3;

/// One related-topic entry of an instant-answer response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelatedTopic {
    #[serde(rename = "Text", default)]
    pub text: Option<String>,
    #[serde(rename = "FirstURL", default)]
    pub first_url: Option<String>,
}

impl RelatedTopic {
    /// Descriptive text, falling back to the URL
    pub fn summary(&self) -> Option<&str> {
        self.text.as_deref().or(self.first_url.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// All related entries for `query`, in response order, blank fields cleared
    async fn fetch_topics(&self, query: &str) -> Result<Vec<RelatedTopic>, BotError> {
        let answer: InstantAnswer = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(answer
            .related_topics
            .into_iter()
            .map(|topic| RelatedTopic {
                text: topic.text.filter(|text| !text.trim().is_empty()),
                first_url: topic.first_url.filter(|url| !url.trim().is_empty()),
            })
            .collect())
    }

    /// Up to `max` related entries for `query`
    ///
    /// Category groups carry neither a text nor a URL and are skipped.
    pub async fn related(&self, query: &str, max: usize) -> Result<Vec<RelatedTopic>, BotError> {
        let topics: Vec<RelatedTopic> = self
            .fetch_topics(query)
            .await?
            .into_iter()
            .filter(|topic| topic.summary().is_some())
            .take(max)
            .collect();

        debug!(query = %query, results = topics.len(), "Search completed");
        Ok(topics)
    }

    /// The first related entry exactly as returned, even when it is a group
    pub async fn first_topic(&self, query: &str) -> Result<Option<RelatedTopic>, BotError> {
        Ok(self.fetch_topics(query).await?.into_iter().next())
    }

    /// Generic fallback answer: one line per related entry
    ///
    /// Never fails; network and parse errors become a fixed friendly string.
    pub async fn answer(&self, query: &str) -> String {
        match self.related(query, ANSWER_RESULTS).await {
            Ok(topics) if topics.is_empty() => t("search-empty"),
            Ok(topics) => topics
                .iter()
                .filter_map(RelatedTopic::summary)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(error = %e, "Search fallback failed");
                t("search-failed")
            }
        }
    }
}
