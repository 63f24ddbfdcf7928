//! Persistence layer: libSQL-backed account-link storage.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::IdentityStore;
