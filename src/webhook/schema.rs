//! Wire types for the assistant platform's fulfillment webhook.
//!
//! Only the subset the dispatcher reads or writes is modelled; unknown keys
//! in requests are ignored. JSON key names follow the platform exactly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Request ─────────────────────────────────────────────────────────────

/// Fulfillment request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub handler: Option<HandlerRef>,
    #[serde(default)]
    pub intent: Option<IntentPayload>,
    #[serde(default)]
    pub scene: Option<ScenePayload>,
    #[serde(default)]
    pub session: Option<SessionPayload>,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, IntentParameterValue>,
    #[serde(default)]
    pub query: Option<String>,
}

/// A matched intent parameter: raw text plus canonical value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentParameterValue {
    #[serde(default)]
    pub original: Option<String>,
    /// Any JSON type; strings, numbers and booleans are usable.
    #[serde(default)]
    pub resolved: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slot_filling_status: Option<String>,
    #[serde(default)]
    pub slots: HashMap<String, SlotPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotPayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub updated: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub account_linking_status: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
}

// ── Response ────────────────────────────────────────────────────────────

/// Fulfillment response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookResponse {
    pub prompt: Prompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserUpdate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(rename = "override")]
    pub override_previous: bool,
    pub last_simple: Simple,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Simple {
    pub speech: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Suggestion {
    pub title: String,
}

/// Values written back to the user's persistent storage.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserUpdate {
    pub params: Map<String, Value>,
}
