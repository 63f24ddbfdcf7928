//! Chat platform abstraction: account directory, presence, and messaging.
//!
//! Action handlers only talk to the chat server through [`ChatPlatform`];
//! [`MattermostClient`] is the production implementation.

pub mod mattermost;

pub use mattermost::MattermostClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PlatformError;

/// A chat account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformUser {
    pub id: String,
    pub username: String,
}

/// A workspace (team) the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Per-workspace unread counters for one account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamUnread {
    pub team_id: String,
    #[serde(default)]
    pub msg_count: i64,
    #[serde(default)]
    pub mention_count: i64,
}

/// Kind of channel, as reported by the chat server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Open,
    Private,
    Direct,
    Group,
}

impl ChannelKind {
    /// Parse the single-letter channel type used on the wire.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Open),
            "P" => Some(Self::Private),
            "D" => Some(Self::Direct),
            "G" => Some(Self::Group),
            _ => None,
        }
    }
}

/// A channel visible to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub kind: Option<ChannelKind>,
}

impl Channel {
    pub fn is_direct(&self) -> bool {
        self.kind == Some(ChannelKind::Direct)
    }
}

/// An account's membership record in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub mention_count: i64,
}

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub message: String,
}

/// Everything the action handlers need from the chat server.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    // ── Account directory ───────────────────────────────────────────

    /// Resolve a username to an account.
    async fn user_by_username(&self, username: &str) -> Result<PlatformUser, PlatformError>;

    /// Fetch an account by id.
    async fn user_by_id(&self, user_id: &str) -> Result<PlatformUser, PlatformError>;

    /// List the workspaces an account belongs to.
    async fn teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, PlatformError>;

    /// Fetch workspace metadata.
    async fn team(&self, team_id: &str) -> Result<Team, PlatformError>;

    // ── Presence ────────────────────────────────────────────────────

    /// Current presence status (`online`, `away`, `dnd`, `offline`).
    async fn get_status(&self, user_id: &str) -> Result<String, PlatformError>;

    /// Set the presence status.
    async fn update_status(&self, user_id: &str, status: &str) -> Result<(), PlatformError>;

    // ── Messaging ───────────────────────────────────────────────────

    /// Create or reuse the direct channel between two accounts. Returns its id.
    async fn direct_channel(&self, user_id: &str, other_user_id: &str)
    -> Result<String, PlatformError>;

    /// Post `message` to a channel on behalf of `user_id`.
    ///
    /// Implementations may attribute the post to their own credential
    /// rather than to `user_id`.
    async fn create_post(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), PlatformError>;

    /// Unread and mention counters for every workspace of an account.
    async fn team_unreads(&self, user_id: &str) -> Result<Vec<TeamUnread>, PlatformError>;

    /// Channels of an account within one workspace (direct channels included).
    async fn channels_for_user(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<Channel>, PlatformError>;

    /// Membership record of an account in a channel.
    async fn channel_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<ChannelMember, PlatformError>;

    /// Most recent post in a channel, if any.
    async fn latest_post(&self, channel_id: &str) -> Result<Option<Post>, PlatformError>;
}
