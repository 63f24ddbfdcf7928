//! Administrative slash commands that manage account links.

pub mod commands;
pub mod routes;

pub use commands::{AdminCommand, CommandResponse};
pub use routes::admin_routes;
