//! Messaging handlers: `send_message` and `read_direct_messages`.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::param;
use crate::actions::{
    ActionContext, ActionFailure, ActionHandler, ActionParams, ActionSuccess, ValidationFailure,
};
use crate::error::PlatformError;
use crate::platform::ChatPlatform;

/// Reply when there is nothing unread.
pub const NO_UNREAD_DMS: &str = "You have no unread DMs";

/// First line of the unread summary.
pub const UNREAD_DMS_HEADER: &str = "Here are your unread direct messages:";

// ── send_message ────────────────────────────────────────────────────

/// Sends a direct message into the caller's direct channel with another
/// account.
///
/// The channel is the caller's, but the post is authored by whatever
/// account the platform client authenticates as; with
/// [`MattermostClient`](crate::platform::MattermostClient) that is the
/// owner of the service token.
///
/// Not idempotent: a retried request posts the message again.
pub struct SendMessageHandler {
    platform: Arc<dyn ChatPlatform>,
}

impl SendMessageHandler {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ActionHandler for SendMessageHandler {
    fn name(&self) -> &str {
        "send_message"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure> {
        let account_id = ctx.account_id()?;
        let target = params.require(param::TARGET_USER, "recipient")?;
        let message = params.require(param::MESSAGE, "message")?;

        let other = match self.platform.user_by_username(target).await {
            Ok(user) => user,
            Err(PlatformError::NotFound { .. }) => {
                debug!(target = %target, "Message target does not resolve");
                return Err(ValidationFailure::UnknownUser(target.to_string()).into());
            }
            Err(e) => return Err(ActionFailure::collaborator("user_by_username", account_id, e)),
        };

        let channel_id = self
            .platform
            .direct_channel(account_id, &other.id)
            .await
            .map_err(|e| ActionFailure::collaborator("direct_channel", account_id, e))?;

        self.platform
            .create_post(&channel_id, account_id, message)
            .await
            .map_err(|e| ActionFailure::collaborator("create_post", account_id, e))?;

        Ok(ActionSuccess::text("Message sent!"))
    }
}

// ── read_direct_messages ────────────────────────────────────────────

/// Reads the latest message of every direct channel that mentions the caller.
pub struct ReadDirectMessagesHandler {
    platform: Arc<dyn ChatPlatform>,
}

impl ReadDirectMessagesHandler {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Rendered lines for every mention-bearing direct channel.
    async fn unread_lines(&self, account_id: &str) -> Result<BTreeSet<String>, ActionFailure> {
        let teams = self
            .platform
            .teams_for_user(account_id)
            .await
            .map_err(|e| ActionFailure::collaborator("teams_for_user", account_id, e))?;

        // Direct channels show up once per team; visit each only once.
        let mut seen = HashSet::new();
        let mut lines = BTreeSet::new();

        for team in &teams {
            let channels = self
                .platform
                .channels_for_user(account_id, &team.id)
                .await
                .map_err(|e| ActionFailure::collaborator("channels_for_user", account_id, e))?;

            for channel in channels.iter().filter(|c| c.is_direct()) {
                if !seen.insert(channel.id.clone()) {
                    continue;
                }

                let member = self
                    .platform
                    .channel_member(&channel.id, account_id)
                    .await
                    .map_err(|e| ActionFailure::collaborator("channel_member", account_id, e))?;
                if member.mention_count <= 0 {
                    continue;
                }

                let Some(post) = self
                    .platform
                    .latest_post(&channel.id)
                    .await
                    .map_err(|e| ActionFailure::collaborator("latest_post", account_id, e))?
                else {
                    continue;
                };

                let sender = self
                    .platform
                    .user_by_id(&post.user_id)
                    .await
                    .map_err(|e| ActionFailure::collaborator("user_by_id", account_id, e))?;

                lines.insert(format!("'{}' wrote '{}'.", sender.username, post.message));
            }
        }

        Ok(lines)
    }
}

#[async_trait]
impl ActionHandler for ReadDirectMessagesHandler {
    fn name(&self) -> &str {
        "read_direct_messages"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        _params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure> {
        let account_id = ctx.account_id()?;
        let lines = self.unread_lines(account_id).await?;

        if lines.is_empty() {
            return Ok(ActionSuccess::text(NO_UNREAD_DMS));
        }

        let mut message = String::from(UNREAD_DMS_HEADER);
        for line in &lines {
            message.push('\n');
            message.push_str(line);
        }
        Ok(ActionSuccess::text(message))
    }
}
