//! REST endpoint receiving the chat server's slash-command posts.
//!
//! The chat server signs every post with the command's token. Posts
//! without the configured token are refused with 401 before anything
//! touches the identity store, since the `user_id` field would otherwise
//! be taken on trust.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use super::commands::{self, AdminCommand, CommandResponse};
use crate::store::IdentityStore;

/// Shared state for admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn IdentityStore>,
    pub command_token: SecretString,
}

/// Slash-command form fields we use; the rest are ignored.
#[derive(Debug, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub token: String,
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub user_id: String,
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// POST /command
async fn run_command(State(state): State<AdminState>, Form(form): Form<SlashCommand>) -> Response {
    let expected = state.command_token.expose_secret();
    if !constant_time_eq(form.token.as_bytes(), expected.as_bytes()) {
        warn!(user_id = %form.user_id, "Slash command with bad token rejected");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let line = format!("{} {}", form.command, form.text);
    let response = match AdminCommand::parse(&line) {
        Some(command) => commands::execute(state.store.as_ref(), &form.user_id, command).await,
        None => CommandResponse::ephemeral(""),
    };
    Json(response).into_response()
}

/// Build the admin routes.
pub fn admin_routes(store: Arc<dyn IdentityStore>, command_token: SecretString) -> Router {
    Router::new()
        .route("/command", post(run_command))
        .with_state(AdminState {
            store,
            command_token,
        })
}
