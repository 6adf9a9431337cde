use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopbuddy::bot::{self, HandlerSettings, WebhookHandler};
use shopbuddy::clients::{ExternalClients, TelegramMessenger};
use shopbuddy::config::BotConfig;
use shopbuddy::cooldown::CooldownGate;
use shopbuddy::expiring_files::ExpiringFiles;
use shopbuddy::localization::init_localization;
use shopbuddy::user_store::JsonFileStore;

/// Seconds between sweeps of expired scratch files
const SCRATCH_SWEEP_SECS: u64 = 30;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting ShopBuddy webhook bot");

    init_localization()?;
    let config = BotConfig::from_env()?;
    info!(
        api_keys = config.api_keys.len(),
        store = %config.store_path.display(),
        "Configuration loaded"
    );

    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let clients = ExternalClients::from_config(&config)?;
    let cooldown = Arc::new(CooldownGate::new(&config.cooldown));

    let scratch = Arc::new(ExpiringFiles::new(chrono::Duration::seconds(
        config.scratch_ttl_secs,
    )));
    let messenger = Arc::new(TelegramMessenger::new(
        Bot::new(&config.telegram_token),
        reqwest::Client::new(),
        Arc::clone(&scratch),
    ));

    // Background sweep of downloaded photos
    let sweeper = Arc::clone(&scratch);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SCRATCH_SWEEP_SECS));
        loop {
            interval.tick().await;
            let removed = sweeper.sweep();
            if removed > 0 {
                info!(removed, "Expired scratch files removed");
            }
        }
    });

    let handler = Arc::new(WebhookHandler::new(
        store,
        messenger,
        clients,
        cooldown,
        HandlerSettings::from_config(&config),
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    bot::serve(listener, handler).await?;

    Ok(())
}
