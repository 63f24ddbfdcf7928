//! `set_username`: lets a first-time caller tell the assistant who they are.

use async_trait::async_trait;

use super::param;
use crate::actions::{ActionContext, ActionFailure, ActionHandler, ActionParams, ActionSuccess};

/// Echoes the spoken username back into `user.params` so the assistant
/// platform sends it as the caller identity on the next turn.
///
/// Runs without a linked account and never touches the identity store or
/// the chat server.
pub struct SetUsernameHandler;

#[async_trait]
impl ActionHandler for SetUsernameHandler {
    fn name(&self) -> &str {
        "set_username"
    }

    fn requires_link(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure> {
        let username = params.require(param::USERNAME, "username")?.trim();

        Ok(ActionSuccess::text(format!("Got it, your username is {username}."))
            .with_user_param(param::USERNAME, username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FailureKind, ResolvedValue};

    #[tokio::test]
    async fn echoes_username_into_user_params() {
        let params = ActionParams::default()
            .with_intent_param(param::USERNAME, ResolvedValue::resolved(" alice "));
        let out = SetUsernameHandler
            .execute(&ActionContext::anonymous(), &params)
            .await
            .unwrap();

        assert_eq!(out.message, "Got it, your username is alice.");
        assert_eq!(out.user_params.unwrap()["username"], "alice");
    }

    #[tokio::test]
    async fn missing_username_is_validation_error() {
        let err = SetUsernameHandler
            .execute(&ActionContext::anonymous(), &ActionParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ValidationError);
    }
}
