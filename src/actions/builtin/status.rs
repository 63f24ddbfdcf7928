//! Presence handlers: `change_status` and `get_status`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::param;
use crate::actions::{ActionContext, ActionFailure, ActionHandler, ActionParams, ActionSuccess};
use crate::platform::ChatPlatform;

// ── change_status ───────────────────────────────────────────────────

/// Sets the caller's presence status and reports the transition.
pub struct ChangeStatusHandler {
    platform: Arc<dyn ChatPlatform>,
}

impl ChangeStatusHandler {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ActionHandler for ChangeStatusHandler {
    fn name(&self) -> &str {
        "change_status"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure> {
        let account_id = ctx.account_id()?;
        let new_status = params.require(param::STATUS, "status")?;

        let old_status = self
            .platform
            .get_status(account_id)
            .await
            .map_err(|e| ActionFailure::collaborator("get_status", account_id, e))?;

        self.platform
            .update_status(account_id, new_status)
            .await
            .map_err(|e| ActionFailure::collaborator("update_status", account_id, e))?;

        Ok(ActionSuccess::text(format!(
            "Changing status from {old_status} to {new_status}"
        )))
    }
}

// ── get_status ──────────────────────────────────────────────────────

/// Summarises presence plus unread and mention counts per workspace.
pub struct GetStatusHandler {
    platform: Arc<dyn ChatPlatform>,
}

impl GetStatusHandler {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ActionHandler for GetStatusHandler {
    fn name(&self) -> &str {
        "get_status"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        _params: &ActionParams,
    ) -> Result<ActionSuccess, ActionFailure> {
        let account_id = ctx.account_id()?;

        let status = self
            .platform
            .get_status(account_id)
            .await
            .map_err(|e| ActionFailure::collaborator("get_status", account_id, e))?;

        let unreads = self
            .platform
            .team_unreads(account_id)
            .await
            .map_err(|e| ActionFailure::collaborator("team_unreads", account_id, e))?;

        let teams = join_all(unreads.iter().map(|u| self.platform.team(&u.team_id))).await;

        let mut lines = vec![format!("Your status is {status}.")];
        for (unread, team) in unreads.iter().zip(teams) {
            match team {
                Ok(team) => lines.push(format!(
                    "{}: {} unread messages, {} mentions.",
                    team.display_name, unread.msg_count, unread.mention_count
                )),
                Err(e) => {
                    debug!(team_id = %unread.team_id, error = %e, "Skipping team without metadata");
                }
            }
        }

        Ok(ActionSuccess::text(lines.join("\n")))
    }
}
