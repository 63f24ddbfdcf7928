//! Typed view of a webhook request, validated once at the boundary.

use std::collections::HashMap;

use serde_json::Value;

use super::schema::{IntentParameterValue, WebhookRequest};
use crate::actions::{ActionParams, ResolvedValue};

/// Key in `user.params` carrying the caller's identity.
pub const IDENTITY_PARAM: &str = "username";

/// Why a request could not become an [`IntentEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("request has no handler name")]
    MissingHandlerName,
}

/// A validated inbound intent.
#[derive(Debug, Clone)]
pub struct IntentEnvelope {
    pub handler_name: String,
    pub params: ActionParams,
    /// Opaque caller identity from the user side of the request.
    pub caller: Option<String>,
    pub session_id: Option<String>,
}

impl TryFrom<WebhookRequest> for IntentEnvelope {
    type Error = EnvelopeError;

    fn try_from(request: WebhookRequest) -> Result<Self, Self::Error> {
        let handler_name = request
            .handler
            .and_then(|h| h.name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(EnvelopeError::MissingHandlerName)?;

        let intent_params: HashMap<String, ResolvedValue> = request
            .intent
            .map(|i| i.params)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name, resolved_value(value)))
            .collect();

        let slots: HashMap<String, Value> = request
            .scene
            .map(|s| s.slots)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, slot)| slot.value.map(|v| (name, v)))
            .collect();

        let caller = request
            .user
            .as_ref()
            .and_then(|u| u.params.get(IDENTITY_PARAM))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            handler_name,
            params: ActionParams::new(intent_params, slots),
            caller,
            session_id: request.session.and_then(|s| s.id),
        })
    }
}

fn resolved_value(value: IntentParameterValue) -> ResolvedValue {
    let resolved = value.resolved.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    });
    ResolvedValue {
        original: value.original,
        resolved,
    }
}
