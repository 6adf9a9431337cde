//! # ShopBuddy Telegram Bot
//!
//! A Telegram webhook bot that keeps a small per-chat profile (nickname,
//! currency, favourite category) and answers with product suggestions,
//! language-model replies and the occasional mood-based quote in groups.

pub mod bot;
pub mod clients;
pub mod config;
pub mod cooldown;
pub mod errors;
pub mod expiring_files;
pub mod localization;
pub mod mood;
pub mod products;
pub mod user_store;
