//! Mattermost REST API v4 client.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Channel, ChannelKind, ChannelMember, ChatPlatform, PlatformUser, Post, Team, TeamUnread};
use crate::config::MattermostConfig;
use crate::error::PlatformError;

/// HTTP client for a Mattermost server, authenticated with a bearer token.
///
/// Every request is made as the owner of the token. Mattermost attributes
/// posts to that account, so messages sent through [`ChatPlatform::create_post`]
/// appear as written by the token owner, not by the caller.
pub struct MattermostClient {
    base_url: Url,
    token: SecretString,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ChannelBody {
    id: String,
    #[serde(rename = "type", default)]
    channel_type: String,
}

#[derive(Debug, Deserialize)]
struct PostList {
    #[serde(default)]
    order: Vec<String>,
    #[serde(default)]
    posts: HashMap<String, Post>,
}

impl MattermostClient {
    pub fn new(config: &MattermostConfig) -> Result<Self, PlatformError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| PlatformError::Http(format!("Invalid server URL {}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Http(format!(
                "Server URL {} cannot carry a path",
                config.url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlatformError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: config.token.clone(),
            client,
        })
    }

    /// `{base}/api/v4/{segments..}`, each segment percent-encoded on its own
    /// so values such as `../x` or `bob?x=1` stay inside one path segment.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v4"]).extend(segments);
        }
        url
    }

    /// Send a request and decode the JSON body.
    ///
    /// `entity`/`id` label a 404 so callers can tell "no such user" apart
    /// from a broken server.
    async fn request<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        entity: &str,
        id: &str,
    ) -> Result<T, PlatformError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let endpoint = url.path().to_string();
        let mut req = self
            .client
            .request(method.clone(), url)
            .bearer_auth(self.token.expose_secret());
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(method = %method, endpoint = %endpoint, "Mattermost request");
        let resp = req
            .send()
            .await
            .map_err(|e| PlatformError::Http(format!("{method} {endpoint}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| PlatformError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        entity: &str,
        id: &str,
    ) -> Result<T, PlatformError> {
        self.request::<T, ()>(Method::GET, self.api_url(segments), None, entity, id)
            .await
    }
}

#[async_trait]
impl ChatPlatform for MattermostClient {
    async fn user_by_username(&self, username: &str) -> Result<PlatformUser, PlatformError> {
        self.get(&["users", "username", username], "user", username)
            .await
    }

    async fn user_by_id(&self, user_id: &str) -> Result<PlatformUser, PlatformError> {
        self.get(&["users", user_id], "user", user_id).await
    }

    async fn teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, PlatformError> {
        self.get(&["users", user_id, "teams"], "user", user_id).await
    }

    async fn team(&self, team_id: &str) -> Result<Team, PlatformError> {
        self.get(&["teams", team_id], "team", team_id).await
    }

    async fn get_status(&self, user_id: &str) -> Result<String, PlatformError> {
        let body: StatusBody = self
            .get(&["users", user_id, "status"], "user", user_id)
            .await?;
        Ok(body.status)
    }

    async fn update_status(&self, user_id: &str, status: &str) -> Result<(), PlatformError> {
        let body = serde_json::json!({ "user_id": user_id, "status": status });
        let _: serde_json::Value = self
            .request(
                Method::PUT,
                self.api_url(&["users", user_id, "status"]),
                Some(&body),
                "user",
                user_id,
            )
            .await?;
        Ok(())
    }

    async fn direct_channel(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> Result<String, PlatformError> {
        let members = [user_id, other_user_id];
        let channel: ChannelBody = self
            .request(
                Method::POST,
                self.api_url(&["channels", "direct"]),
                Some(&members),
                "user",
                other_user_id,
            )
            .await?;
        Ok(channel.id)
    }

    async fn create_post(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), PlatformError> {
        // The server takes the author from the token, so only channel and
        // text are sent.
        debug!(channel_id = %channel_id, on_behalf_of = %user_id, "Creating post");
        let body = serde_json::json!({
            "channel_id": channel_id,
            "message": message,
        });
        let _: serde_json::Value = self
            .request(
                Method::POST,
                self.api_url(&["posts"]),
                Some(&body),
                "channel",
                channel_id,
            )
            .await?;
        Ok(())
    }

    async fn team_unreads(&self, user_id: &str) -> Result<Vec<TeamUnread>, PlatformError> {
        self.get(&["users", user_id, "teams", "unread"], "user", user_id)
            .await
    }

    async fn channels_for_user(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<Channel>, PlatformError> {
        let raw: Vec<ChannelBody> = self
            .get(&["users", user_id, "teams", team_id, "channels"], "team", team_id)
            .await?;
        Ok(raw
            .into_iter()
            .map(|c| Channel {
                kind: ChannelKind::from_code(&c.channel_type),
                id: c.id,
            })
            .collect())
    }

    async fn channel_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<ChannelMember, PlatformError> {
        self.get(&["channels", channel_id, "members", user_id], "channel", channel_id)
            .await
    }

    async fn latest_post(&self, channel_id: &str) -> Result<Option<Post>, PlatformError> {
        let mut url = self.api_url(&["channels", channel_id, "posts"]);
        url.query_pairs_mut().append_pair("per_page", "1");

        let mut list: PostList = self
            .request::<PostList, ()>(Method::GET, url, None, "channel", channel_id)
            .await?;
        Ok(list
            .order
            .first()
            .and_then(|id| list.posts.remove(id)))
    }
}
