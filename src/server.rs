//! Application router: webhook, admin commands, and health.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::actions::HandlerRegistry;
use crate::admin::admin_routes;
use crate::store::IdentityStore;
use crate::webhook::{IntentDispatcher, webhook_routes};

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "assistant-bridge"
    }))
}

/// Build the full HTTP application.
///
/// `command_token` is the secret the chat server sends with slash commands.
pub fn router(
    store: Arc<dyn IdentityStore>,
    registry: Arc<HandlerRegistry>,
    command_token: SecretString,
) -> Router {
    let dispatcher = Arc::new(IntentDispatcher::new(Arc::clone(&store), registry));

    Router::new()
        .route("/health", get(health))
        .merge(webhook_routes(dispatcher))
        .merge(admin_routes(store, command_token))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
