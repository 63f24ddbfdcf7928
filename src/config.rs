//! Configuration types.
//!
//! The whole configuration is read once at startup into an immutable
//! [`AppConfig`] snapshot and handed to the components that need it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default number of rows scanned by the reverse identity lookup.
pub const DEFAULT_LINK_SCAN_LIMIT: usize = 100;

/// Service configuration snapshot.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub mattermost: MattermostConfig,
    pub admin: AdminConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

/// Identity store settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Page cap for `resolve_by_account_id`.
    pub scan_limit: usize,
}

/// Chat server connection settings.
#[derive(Debug, Clone)]
pub struct MattermostConfig {
    /// Base URL, e.g. `https://chat.example.com`.
    pub url: String,
    pub token: SecretString,
    pub timeout: Duration,
}

/// Slash-command settings.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Token the chat server sends with every `/assistant` command post.
    pub command_token: SecretString,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/assistant-bridge.db"),
            scan_limit: DEFAULT_LINK_SCAN_LIMIT,
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "BRIDGE_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        let db_path = lookup("BRIDGE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| StoreConfig::default().db_path);
        let scan_limit = parse_or(&lookup, "BRIDGE_LINK_SCAN_LIMIT", DEFAULT_LINK_SCAN_LIMIT)?;
        if scan_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BRIDGE_LINK_SCAN_LIMIT".into(),
                message: "must be greater than zero".into(),
            });
        }

        let url = lookup("MATTERMOST_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("MATTERMOST_URL".into()))?;
        let token = lookup("MATTERMOST_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("MATTERMOST_TOKEN".into()))?;
        let timeout_secs: u64 = parse_or(&lookup, "MATTERMOST_TIMEOUT_SECS", 10)?;
        let command_token = lookup("MATTERMOST_COMMAND_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("MATTERMOST_COMMAND_TOKEN".into()))?;

        Ok(Self {
            server: ServerConfig { bind_addr },
            store: StoreConfig {
                db_path,
                scan_limit,
            },
            mattermost: MattermostConfig {
                url: url.trim_end_matches('/').to_string(),
                token: SecretString::from(token),
                timeout: Duration::from_secs(timeout_secs),
            },
            admin: AdminConfig {
                command_token: SecretString::from(command_token),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
