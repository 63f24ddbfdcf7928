//! HTTP endpoint for assistant fulfillment.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use tracing::debug;

use super::dispatcher::{Dispatch, IntentDispatcher};

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<IntentDispatcher>,
}

/// POST /webhook
///
/// Any other method, an undecodable body, or a request without a handler
/// name is answered with a bare 400. Everything else gets a 200 with a
/// conversational reply.
async fn fulfill(State(state): State<WebhookState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        debug!(method = %method, "Rejecting non-POST webhook call");
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.dispatcher.dispatch_body(&body).await {
        Dispatch::Completed(envelope) => (StatusCode::OK, Json(envelope.to_wire())).into_response(),
        Dispatch::Rejected(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Build the webhook route.
pub fn webhook_routes(dispatcher: Arc<IntentDispatcher>) -> Router {
    Router::new()
        .route("/webhook", any(fulfill))
        .with_state(WebhookState { dispatcher })
}
