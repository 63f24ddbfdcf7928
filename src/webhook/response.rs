//! Outgoing conversational reply and its wire encoding.

use serde_json::{Map, Value};

use super::schema::{Prompt, Simple, Suggestion, UserUpdate, WebhookResponse};

/// Suggestion chips offered after every conversational reply, in order.
pub const SUGGESTION_CHIPS: [&str; 4] = [
    "Change status to away",
    "Status Report",
    "Read messages",
    "Write message",
];

/// A finished reply, independent of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEnvelope {
    pub primary_text: String,
    pub suggestion_chips: Vec<String>,
    /// Written to `user.params`; only `set_username` fills it.
    pub side_channel: Option<Map<String, Value>>,
}

/// Assembles an [`OutgoingEnvelope`]. The chip set is appended by
/// [`build`](Self::build) and nowhere else.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    text: String,
    side_channel: Option<Map<String, Value>>,
}

impl ResponseBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            side_channel: None,
        }
    }

    pub fn side_channel(mut self, fields: Option<Map<String, Value>>) -> Self {
        self.side_channel = fields.filter(|f| !f.is_empty());
        self
    }

    pub fn build(self) -> OutgoingEnvelope {
        OutgoingEnvelope {
            primary_text: self.text,
            suggestion_chips: SUGGESTION_CHIPS.iter().map(|c| c.to_string()).collect(),
            side_channel: self.side_channel,
        }
    }
}

impl OutgoingEnvelope {
    /// Encode as the platform's multi-modal response.
    pub fn to_wire(&self) -> WebhookResponse {
        WebhookResponse {
            prompt: Prompt {
                override_previous: false,
                last_simple: Simple {
                    speech: self.primary_text.clone(),
                    text: self.primary_text.clone(),
                },
                suggestions: self
                    .suggestion_chips
                    .iter()
                    .map(|title| Suggestion {
                        title: title.clone(),
                    })
                    .collect(),
            },
            user: self.side_channel.clone().map(|params| UserUpdate { params }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chips_appended_once_in_order() {
        let env = ResponseBuilder::new("hello").build();
        assert_eq!(env.primary_text, "hello");
        assert_eq!(env.suggestion_chips, SUGGESTION_CHIPS);
        assert!(env.side_channel.is_none());
    }

    #[test]
    fn wire_encoding_carries_text_and_side_channel() {
        let mut fields = Map::new();
        fields.insert("username".into(), Value::from("alice"));
        let wire = ResponseBuilder::new("Got it")
            .side_channel(Some(fields))
            .build()
            .to_wire();

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["prompt"]["lastSimple"]["text"], "Got it");
        assert_eq!(json["prompt"]["lastSimple"]["speech"], "Got it");
        assert_eq!(json["prompt"]["suggestions"].as_array().unwrap().len(), 4);
        assert_eq!(json["prompt"]["suggestions"][3]["title"], "Write message");
        assert_eq!(json["user"]["params"]["username"], "alice");
    }

    #[test]
    fn empty_side_channel_is_dropped() {
        let env = ResponseBuilder::new("x").side_channel(Some(Map::new())).build();
        assert!(env.side_channel.is_none());
        assert!(env.to_wire().user.is_none());
    }
}
