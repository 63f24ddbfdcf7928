//! Intent parameters as seen by action handlers.

use std::collections::HashMap;

use serde_json::Value;

use super::{ActionFailure, ValidationFailure};

/// A parameter value as resolved by the assistant platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Raw utterance fragment.
    pub original: Option<String>,
    /// Canonicalized value. Only this takes part in routing.
    pub resolved: Option<String>,
}

impl ResolvedValue {
    pub fn resolved(value: impl Into<String>) -> Self {
        Self {
            original: None,
            resolved: Some(value.into()),
        }
    }
}

/// Intent parameters plus scene slots of one request.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    intent: HashMap<String, ResolvedValue>,
    slots: HashMap<String, Value>,
}

impl ActionParams {
    pub fn new(intent: HashMap<String, ResolvedValue>, slots: HashMap<String, Value>) -> Self {
        Self { intent, slots }
    }

    pub fn with_intent_param(mut self, name: impl Into<String>, value: ResolvedValue) -> Self {
        self.intent.insert(name.into(), value);
        self
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    /// Resolved value of `name`: the intent parameter first, then a string
    /// scene slot. Blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        let from_intent = self
            .intent
            .get(name)
            .and_then(|v| v.resolved.as_deref())
            .filter(|s| !s.trim().is_empty());

        from_intent.or_else(|| {
            self.slots
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        })
    }

    /// Like [`get`](Self::get) but a missing value is a validation failure
    /// reported under `label`.
    pub fn require(&self, name: &str, label: &str) -> Result<&str, ActionFailure> {
        self.get(name)
            .ok_or_else(|| ValidationFailure::MissingParam(label.to_string()).into())
    }
}
