//! Assistant bridge: voice-assistant fulfillment webhook for a Mattermost server.

pub mod actions;
pub mod admin;
pub mod config;
pub mod error;
pub mod platform;
pub mod server;
pub mod store;
pub mod webhook;
