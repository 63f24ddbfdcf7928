//! Handler registry for routing intents by name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::actions::ActionHandler;
use crate::actions::builtin::{
    ChangeStatusHandler, GetStatusHandler, ReadDirectMessagesHandler, SendMessageHandler,
    SetUsernameHandler,
};
use crate::platform::ChatPlatform;

/// Registry of available handlers, keyed by exact handler name.
///
/// Built once at startup and shared read-only between requests.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the five built-in handlers.
    pub fn with_builtins(platform: Arc<dyn ChatPlatform>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ChangeStatusHandler::new(Arc::clone(&platform))));
        registry.register(Arc::new(SendMessageHandler::new(Arc::clone(&platform))));
        registry.register(Arc::new(GetStatusHandler::new(Arc::clone(&platform))));
        registry.register(Arc::new(ReadDirectMessagesHandler::new(platform)));
        registry.register(Arc::new(SetUsernameHandler));
        registry
    }

    /// Register a handler. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!(handler = %name, "Replaced existing handler registration");
        } else {
            tracing::debug!("Registered handler: {}", name);
        }
    }

    /// Get a handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// List all handler names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
