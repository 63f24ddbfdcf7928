//! Error types for the assistant bridge.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Account-link errors raised by the identity store.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity {identity} is already linked")]
    AlreadyLinked { identity: String },

    #[error("Identity {identity} is not linked")]
    NotLinked { identity: String },

    #[error("No identity linked to account {account_id}")]
    NotFound { account_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Chat platform (account directory, presence, messaging) errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("Request to {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
