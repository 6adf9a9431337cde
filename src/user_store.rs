//! # User Store Module
//!
//! Per-chat profile records persisted as a single JSON document that maps
//! chat-id strings to profiles. The document is read and rewritten in full on
//! every mutation; the read-modify-write cycle runs under an in-process mutex.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::errors::BotError;

/// Currency assumed when a profile never stored one
pub const DEFAULT_CURRENCY: &str = "INR";

/// Geographic point shared by the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Represents a chat's stored profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Set once onboarding prompts were sent
    #[serde(default)]
    pub initialized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// ISO 4217 code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl UserProfile {
    /// Stored currency, or [`DEFAULT_CURRENCY`] when none was ever derived
    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    /// Shallow merge: fields present in the patch overwrite, others stay
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(initialized) = patch.initialized {
            self.initialized = initialized;
        }
        if let Some(nickname) = patch.nickname {
            self.nickname = Some(nickname);
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(currency) = patch.currency {
            self.currency = Some(currency);
        }
    }
}

/// Partial profile update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub initialized: Option<bool>,
    pub nickname: Option<String>,
    pub category: Option<String>,
    pub location: Option<Location>,
    pub currency: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The whole persisted document
pub type ProfileMap = HashMap<String, UserProfile>;

/// Key-value store of chat profiles with an atomic upsert
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read the full mapping; an absent or corrupt document reads as empty
    async fn load(&self) -> ProfileMap;

    /// Profile for `chat_id`, empty when the chat was never stored.
    /// Does not write: the empty profile only becomes durable on `update`.
    async fn get(&self, chat_id: i64) -> UserProfile;

    /// Merge `patch` into the stored profile and persist. Returns the merged profile.
    async fn update(&self, chat_id: i64, patch: ProfilePatch) -> UserProfile;
}

/// Profile store backed by one JSON file
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<ProfileMap, BotError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Profile store {} does not exist yet", self.path.display());
                return Ok(ProfileMap::new());
            }
            Err(e) => {
                return Err(BotError::Storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            BotError::Storage(format!("{} is malformed: {}", self.path.display(), e))
        })
    }

    async fn write_document(&self, map: &ProfileMap) -> Result<(), BotError> {
        let body = serde_json::to_string_pretty(map)
            .map_err(|e| BotError::Storage(format!("failed to serialize profiles: {e}")))?;

        tokio::fs::write(&self.path, body).await.map_err(|e| {
            BotError::Storage(format!("failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Read the document, treating an unreadable store as empty
    async fn read_or_empty(&self) -> ProfileMap {
        self.read_document().await.unwrap_or_else(|e| {
            warn!("{}, treating the profile store as empty", e);
            ProfileMap::new()
        })
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn load(&self) -> ProfileMap {
        self.read_or_empty().await
    }

    async fn get(&self, chat_id: i64) -> UserProfile {
        let map = self.read_or_empty().await;
        match map.get(&chat_id.to_string()) {
            Some(profile) => profile.clone(),
            None => {
                debug!("No profile stored for chat {}", chat_id);
                UserProfile::default()
            }
        }
    }

    async fn update(&self, chat_id: i64, patch: ProfilePatch) -> UserProfile {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_or_empty().await;
        let profile = map.entry(chat_id.to_string()).or_default();
        profile.apply(patch);
        let merged = profile.clone();

        match self.write_document(&map).await {
            Ok(()) => info!("Profile updated for chat {}", chat_id),
            Err(e) => error!("Profile update for chat {} not persisted: {}", chat_id, e),
        }

        merged
    }
}
