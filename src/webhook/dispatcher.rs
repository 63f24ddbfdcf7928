//! Intent dispatcher: validates, authenticates, routes, and normalizes.
//!
//! A request moves `Received → Validated → Authenticated → Routed →
//! Completed`. Only an undecodable body or a missing handler name ends in
//! `Rejected`; every other failure is a soft failure that still completes
//! with an apologetic reply.

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, debug, field, info, info_span, warn};
use uuid::Uuid;

use super::envelope::{EnvelopeError, IntentEnvelope};
use super::response::{OutgoingEnvelope, ResponseBuilder};
use super::schema::WebhookRequest;
use crate::actions::{ActionContext, ActionFailure, HandlerRegistry, ValidationFailure};
use crate::error::IdentityError;
use crate::store::IdentityStore;

pub const USERNAME_NOT_SET: &str =
    "Sorry, you didn't set your username yet. Say \"my username is\" followed by your username.";
pub const INTEGRATION_NOT_ENABLED: &str =
    "Sorry, you didn't enable the integration. Run /assistant connect <username> in Mattermost first.";
pub const UNKNOWN_HANDLER: &str = "Sorry, don't know what to do!";
pub const COLLABORATOR_FAILED: &str = "Sorry, something went wrong while talking to Mattermost.";

/// Dispatch progress, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Validated,
    Authenticated,
    Routed,
    Completed,
    Rejected,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Authenticated => "authenticated",
            Self::Routed => "routed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Why a request was refused outright.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("malformed request body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    Invalid(#[from] EnvelopeError),
}

/// Terminal result of one dispatch.
#[derive(Debug)]
pub enum Dispatch {
    /// A conversational reply, including soft failures.
    Completed(OutgoingEnvelope),
    /// A transport-level failure; answered without a body.
    Rejected(Rejection),
}

/// Routes validated intents to action handlers.
pub struct IntentDispatcher {
    store: Arc<dyn IdentityStore>,
    registry: Arc<HandlerRegistry>,
}

impl IntentDispatcher {
    pub fn new(store: Arc<dyn IdentityStore>, registry: Arc<HandlerRegistry>) -> Self {
        Self { store, registry }
    }

    /// Decode a raw request body and dispatch it.
    pub async fn dispatch_body(&self, body: &[u8]) -> Dispatch {
        let span = info_span!(
            "webhook",
            request_id = %Uuid::new_v4(),
            handler = field::Empty,
            session = field::Empty,
        );

        async {
            debug!(state = %DispatchState::Received, bytes = body.len());
            match serde_json::from_slice::<WebhookRequest>(body) {
                Ok(request) => self.dispatch(request).await,
                Err(e) => {
                    warn!(state = %DispatchState::Rejected, error = %e, "Cannot decode webhook body");
                    Dispatch::Rejected(e.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Dispatch an already decoded request.
    pub async fn dispatch(&self, request: WebhookRequest) -> Dispatch {
        let envelope = match IntentEnvelope::try_from(request) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(state = %DispatchState::Rejected, error = %e, "Invalid webhook request");
                return Dispatch::Rejected(e.into());
            }
        };

        let span = tracing::Span::current();
        span.record("handler", envelope.handler_name.as_str());
        if let Some(session) = &envelope.session_id {
            span.record("session", session.as_str());
        }
        debug!(state = %DispatchState::Validated);

        let envelope = self.route(envelope).await;
        debug!(state = %DispatchState::Completed);
        Dispatch::Completed(envelope)
    }

    async fn route(&self, envelope: IntentEnvelope) -> OutgoingEnvelope {
        let handler = self.registry.get(&envelope.handler_name);

        // Unknown handlers still authenticate first; only set_username opts out.
        let needs_link = handler.as_ref().is_none_or(|h| h.requires_link());
        let ctx = if needs_link {
            match self.authenticate(envelope.caller.as_deref()).await {
                Ok(account_id) => ActionContext::for_account(account_id),
                Err(text) => return ResponseBuilder::new(text).build(),
            }
        } else {
            ActionContext::anonymous()
        };
        debug!(state = %DispatchState::Authenticated);

        let Some(handler) = handler else {
            let failure = ActionFailure::UnknownHandler {
                name: envelope.handler_name,
            };
            info!(error = %failure, "No handler registered");
            return ResponseBuilder::new(apology_for(&failure)).build();
        };
        debug!(state = %DispatchState::Routed);

        match handler.execute(&ctx, &envelope.params).await {
            Ok(success) => ResponseBuilder::new(success.message)
                .side_channel(success.user_params)
                .build(),
            Err(failure) => {
                debug!(kind = ?failure.kind(), error = %failure, "Handler soft-failed");
                ResponseBuilder::new(apology_for(&failure)).build()
            }
        }
    }

    /// Resolve the caller to a chat account, or pick the apology to speak.
    async fn authenticate(&self, caller: Option<&str>) -> Result<String, &'static str> {
        let Some(identity) = caller else {
            return Err(USERNAME_NOT_SET);
        };

        match self.store.resolve(identity).await {
            Ok(account_id) => Ok(account_id),
            Err(IdentityError::NotLinked { .. }) => {
                info!(identity = %identity, "Caller has no linked account");
                Err(INTEGRATION_NOT_ENABLED)
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Identity lookup failed");
                Err(COLLABORATOR_FAILED)
            }
        }
    }
}

/// Spoken text for a handler failure.
pub fn apology_for(failure: &ActionFailure) -> String {
    match failure {
        ActionFailure::Unauthenticated => INTEGRATION_NOT_ENABLED.to_string(),
        ActionFailure::UnknownHandler { .. } => UNKNOWN_HANDLER.to_string(),
        ActionFailure::Collaborator { .. } => COLLABORATOR_FAILED.to_string(),
        ActionFailure::Validation(ValidationFailure::MissingParam(param)) => {
            format!("Sorry, I didn't catch the {param}.")
        }
        ActionFailure::Validation(ValidationFailure::UnknownUser(username)) => {
            format!("Sorry, I couldn't find a user called {username}.")
        }
    }
}
