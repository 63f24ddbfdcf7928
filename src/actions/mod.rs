//! Action handlers: the operations an assistant intent can trigger.
//!
//! Each handler wraps one chat-platform interaction. Handlers never see the
//! identity store: the dispatcher resolves the caller's account first and
//! passes it in through [`ActionContext`].

pub mod builtin;
pub mod params;
pub mod registry;

pub use params::{ActionParams, ResolvedValue};
pub use registry::HandlerRegistry;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PlatformError;

/// Per-invocation context handed to a handler.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// Chat account of the caller, absent for handlers that skip linking.
    pub account_id: Option<String>,
}

impl ActionContext {
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The caller's account, or `Unauthenticated`.
    pub fn account_id(&self) -> Result<&str, ActionFailure> {
        self.account_id
            .as_deref()
            .ok_or(ActionFailure::Unauthenticated)
    }
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSuccess {
    /// Text spoken and shown to the user.
    pub message: String,
    /// Values the assistant platform should persist in `user.params`.
    pub user_params: Option<Map<String, Value>>,
}

impl ActionSuccess {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_params: None,
        }
    }

    pub fn with_user_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Coarse failure classification reported to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthenticated,
    UnknownHandler,
    CollaboratorError,
    ValidationError,
}

/// Why the caller's input could not be acted on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("missing parameter {0}")]
    MissingParam(String),

    #[error("unknown user {0}")]
    UnknownUser(String),
}

/// Handler failure.
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("no handler named {name}")]
    UnknownHandler { name: String },

    #[error("{operation} failed: {source}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),
}

impl ActionFailure {
    /// Wrap a chat-platform error, logging it once here where it was detected.
    pub fn collaborator(operation: &'static str, account_id: &str, source: PlatformError) -> Self {
        warn!(
            operation,
            account_id = %account_id,
            error = %source,
            "Chat platform call failed"
        );
        Self::Collaborator { operation, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthenticated => FailureKind::Unauthenticated,
            Self::UnknownHandler { .. } => FailureKind::UnknownHandler,
            Self::Collaborator { .. } => FailureKind::CollaboratorError,
            Self::Validation(_) => FailureKind::ValidationError,
        }
    }
}

/// A named operation reachable from an assistant intent.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handler name matched against `handler.name` in the webhook request.
    fn name(&self) -> &str;

    /// Whether the caller must have a linked chat account.
    fn requires_link(&self) -> bool {
        true
    }

    /// Run the action.
    async fn execute(
        &self,
        ctx: &ActionContext,
        params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_is_unauthenticated() {
        let err = ActionContext::anonymous().account_id().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unauthenticated);
        assert_eq!(ActionContext::for_account("uid").account_id().unwrap(), "uid");
    }

    #[test]
    fn user_params_accumulate() {
        let success = ActionSuccess::text("ok")
            .with_user_param("username", "alice")
            .with_user_param("locale", "en");
        let params = success.user_params.unwrap();
        assert_eq!(params["username"], "alice");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn failure_kinds() {
        let v: ActionFailure = ValidationFailure::MissingParam("status".into()).into();
        assert_eq!(v.kind(), FailureKind::ValidationError);

        let c = ActionFailure::collaborator("get_status", "uid", PlatformError::Http("down".into()));
        assert_eq!(c.kind(), FailureKind::CollaboratorError);
        assert!(c.to_string().contains("get_status"));
    }
}
