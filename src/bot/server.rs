//! Webhook HTTP server
//!
//! `POST /` and `POST /webhook` accept Telegram updates; other methods on
//! those paths are answered with 405 by the router.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::update::WebhookUpdate;
use super::webhook_handler::{HandleOutcome, WebhookHandler};

/// Build the router around a shared handler
pub fn router(handler: Arc<WebhookHandler>) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(handler)
}

/// Serve the webhook until the listener fails
pub async fn serve(listener: TcpListener, handler: Arc<WebhookHandler>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Webhook server listening on http://{}", addr);
    }
    axum::serve(listener, router(handler)).await
}

async fn health() -> (StatusCode, String) {
    (StatusCode::OK, "OK".to_string())
}

async fn handle_webhook(
    State(handler): State<Arc<WebhookHandler>>,
    body: Bytes,
) -> (StatusCode, String) {
    let update: WebhookUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Ignoring body that is not a Telegram update");
            return (StatusCode::OK, "Ignored".to_string());
        }
    };

    match handler.handle_update(update).await {
        Ok(HandleOutcome::Ignored) => (StatusCode::OK, "Ignored".to_string()),
        Ok(HandleOutcome::Onboarded) => (StatusCode::OK, "Onboarded".to_string()),
        Ok(HandleOutcome::Replied(_)) => (StatusCode::OK, "OK".to_string()),
        Err(e) => {
            error!(error = %e, "Webhook handling failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    }
}
