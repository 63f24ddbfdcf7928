//! Built-in action handlers.

pub mod messages;
pub mod status;
pub mod username;

pub use messages::{ReadDirectMessagesHandler, SendMessageHandler};
pub use status::{ChangeStatusHandler, GetStatusHandler};
pub use username::SetUsernameHandler;

/// Intent parameter names used by the assistant project.
pub mod param {
    pub const STATUS: &str = "status";
    pub const TARGET_USER: &str = "other_user";
    pub const MESSAGE: &str = "message";
    pub const USERNAME: &str = "username";
}
