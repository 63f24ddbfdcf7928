//! `/assistant connect|disconnect`: writes the account links the webhook reads.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::IdentityError;
use crate::store::IdentityStore;

/// Slash-command trigger handled here.
pub const TRIGGER: &str = "assistant";

pub const CONNECTED: &str = "Connected!";
pub const DISCONNECTED: &str = "Disconnected!";
pub const CONNECT_SYNTAX: &str = "Syntax: /assistant connect <username>";
pub const ALREADY_CONNECTED: &str =
    "That username is already connected. Run /assistant disconnect first.";
pub const NOTHING_CONNECTED: &str = "No assistant account is connected.";
pub const HELP: &str = "Only connect/disconnect commands are supported!";
pub const STORAGE_FAILED: &str = "Something went wrong, please try again later.";

/// A parsed administrative command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Link the given assistant identity to the invoking account.
    Connect { identity: String },
    /// Remove whatever identity is linked to the invoking account.
    Disconnect,
    /// `connect` with the wrong number of arguments.
    ConnectUsage,
    /// Missing or unknown subcommand.
    Help,
}

impl AdminCommand {
    /// Parse a full command line such as `/assistant connect you@gmail.com`.
    ///
    /// Returns `None` when the trigger isn't ours.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let trigger = parts.first()?.trim_start_matches('/');
        if trigger != TRIGGER {
            return None;
        }

        let command = match parts.get(1).copied() {
            Some("connect") if parts.len() == 3 => Self::Connect {
                identity: parts[2].to_string(),
            },
            Some("connect") => Self::ConnectUsage,
            Some("disconnect") => Self::Disconnect,
            _ => Self::Help,
        };
        Some(command)
    }
}

/// Ephemeral reply shown only to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub response_type: &'static str,
    pub text: String,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral",
            text: text.into(),
        }
    }
}

/// Run a command on behalf of `account_id`.
pub async fn execute(
    store: &dyn IdentityStore,
    account_id: &str,
    command: AdminCommand,
) -> CommandResponse {
    match command {
        AdminCommand::Connect { identity } => match store.link(&identity, account_id).await {
            Ok(()) => {
                info!(identity = %identity, account_id = %account_id, "Assistant account connected");
                CommandResponse::ephemeral(CONNECTED)
            }
            Err(IdentityError::AlreadyLinked { .. }) => CommandResponse::ephemeral(ALREADY_CONNECTED),
            Err(e) => {
                warn!(operation = "link", identity = %identity, error = %e, "Identity store failed");
                CommandResponse::ephemeral(STORAGE_FAILED)
            }
        },
        AdminCommand::Disconnect => disconnect(store, account_id).await,
        AdminCommand::ConnectUsage => CommandResponse::ephemeral(CONNECT_SYNTAX),
        AdminCommand::Help => CommandResponse::ephemeral(HELP),
    }
}

/// Unlink every identity pointing at `account_id`.
///
/// `connect` may have linked several identities to one account, so the
/// reverse lookup is repeated until it finds nothing.
async fn disconnect(store: &dyn IdentityStore, account_id: &str) -> CommandResponse {
    let mut removed = 0usize;
    loop {
        let identity = match store.resolve_by_account_id(account_id).await {
            Ok(identity) => identity,
            Err(IdentityError::NotFound { .. }) => break,
            Err(e) => {
                warn!(operation = "resolve_by_account_id", account_id = %account_id, error = %e, "Identity store failed");
                return CommandResponse::ephemeral(STORAGE_FAILED);
            }
        };

        match store.unlink(&identity).await {
            // A concurrent disconnect already removed it; the outcome is the same.
            Ok(()) | Err(IdentityError::NotLinked { .. }) => {
                info!(identity = %identity, account_id = %account_id, "Assistant account disconnected");
                removed += 1;
            }
            Err(e) => {
                warn!(operation = "unlink", identity = %identity, error = %e, "Identity store failed");
                return CommandResponse::ephemeral(STORAGE_FAILED);
            }
        }
    }

    if removed == 0 {
        CommandResponse::ephemeral(NOTHING_CONNECTED)
    } else {
        CommandResponse::ephemeral(DISCONNECTED)
    }
}
