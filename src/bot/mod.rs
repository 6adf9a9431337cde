//! Bot module for handling Telegram webhook traffic
//!
//! This module is split into several submodules:
//! - `update`: Inbound update payloads
//! - `webhook_handler`: Profile enrichment and reply routing
//! - `ui_builder`: Creates keyboards and formats messages
//! - `server`: The HTTP endpoint

pub mod server;
pub mod ui_builder;
pub mod update;
pub mod webhook_handler;

// Re-export main entry points for use in main.rs
pub use server::{router, serve};
pub use update::{ChatEvent, WebhookUpdate};
pub use webhook_handler::{HandleOutcome, HandlerSettings, ReplyRoute, WebhookHandler};
