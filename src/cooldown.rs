//! # Cooldown Gate Module
//!
//! This module throttles unsolicited replies in group chats. A chat is
//! allowed at most one gated reply per interval; the state lives only in
//! process memory and is lost on restart.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CooldownConfig;

/// Per-chat cooldown for unsolicited group replies
///
/// # Behavior
///
/// - `try_acquire` succeeds when no reply was allowed for the chat within
///   the interval, and records the current instant
/// - A refused attempt leaves the recorded instant untouched
/// - Chats are tracked independently
#[derive(Debug)]
pub struct CooldownGate {
    last_allowed: Mutex<HashMap<i64, Instant>>,
    interval: Duration,
}

impl CooldownGate {
    /// Create a gate with the interval from `config`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shopbuddy::config::CooldownConfig;
    /// use shopbuddy::cooldown::CooldownGate;
    ///
    /// let gate = CooldownGate::new(&CooldownConfig::default());
    /// assert!(gate.try_acquire(42));
    /// assert!(!gate.try_acquire(42));
    /// ```
    pub fn new(config: &CooldownConfig) -> Self {
        Self::with_interval(Duration::from_secs(config.interval_secs))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last_allowed: Mutex::new(HashMap::new()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Try to take the chat's reply slot now
    pub fn try_acquire(&self, chat_id: i64) -> bool {
        self.try_acquire_at(chat_id, Instant::now())
    }

    /// Try to take the chat's reply slot at an explicit instant
    pub fn try_acquire_at(&self, chat_id: i64, now: Instant) -> bool {
        let mut last_allowed = self
            .last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = last_allowed.get(&chat_id) {
            if now.saturating_duration_since(*last) < self.interval {
                return false;
            }
        }
        last_allowed.insert(chat_id, now);
        true
    }

    /// Instant of the last allowed reply for a chat
    pub fn last_allowed(&self, chat_id: i64) -> Option<Instant> {
        self.last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat_id)
            .copied()
    }

    /// Forget every chat
    pub fn reset(&self) {
        self.last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
