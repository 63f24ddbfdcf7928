//! libSQL backend: async `IdentityStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::config::DEFAULT_LINK_SCAN_LIMIT;
use crate::error::{DatabaseError, IdentityError};
use crate::store::migrations;
use crate::store::traits::IdentityStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    scan_limit: usize,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            conn,
            scan_limit: DEFAULT_LINK_SCAN_LIMIT,
        })
    }

    /// Override the page cap used by the reverse lookup.
    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit.max(1);
        self
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl IdentityStore for LibSqlBackend {
    async fn link(&self, external_identity: &str, account_id: &str) -> Result<(), IdentityError> {
        let now = Utc::now().to_rfc3339();
        let inserted = self
            .conn()
            .execute(
                "INSERT INTO account_links (external_identity, account_id, linked_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (external_identity) DO NOTHING",
                params![external_identity, account_id, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("link: {e}")))?;

        if inserted == 0 {
            return Err(IdentityError::AlreadyLinked {
                identity: external_identity.to_string(),
            });
        }

        debug!(identity = %external_identity, account_id = %account_id, "Account linked");
        Ok(())
    }

    async fn unlink(&self, external_identity: &str) -> Result<(), IdentityError> {
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM account_links WHERE external_identity = ?1",
                params![external_identity],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("unlink: {e}")))?;

        if deleted == 0 {
            return Err(IdentityError::NotLinked {
                identity: external_identity.to_string(),
            });
        }

        debug!(identity = %external_identity, "Account unlinked");
        Ok(())
    }

    async fn resolve(&self, external_identity: &str) -> Result<String, IdentityError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT account_id FROM account_links WHERE external_identity = ?1",
                params![external_identity],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("resolve: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map_err(|e| DatabaseError::Query(format!("resolve: {e}")).into()),
            Ok(None) => Err(IdentityError::NotLinked {
                identity: external_identity.to_string(),
            }),
            Err(e) => Err(DatabaseError::Query(format!("resolve: {e}")).into()),
        }
    }

    async fn resolve_by_account_id(&self, account_id: &str) -> Result<String, IdentityError> {
        // Deliberately unindexed: walk one page of links and compare values.
        let mut rows = self
            .conn()
            .query(
                "SELECT external_identity, account_id FROM account_links
                 ORDER BY external_identity LIMIT ?1",
                params![self.scan_limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("resolve_by_account_id: {e}")))?;

        loop {
            let row = rows
                .next()
                .await
                .map_err(|e| DatabaseError::Query(format!("resolve_by_account_id: {e}")))?;
            let Some(row) = row else { break };

            let linked: String = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("resolve_by_account_id: {e}")))?;
            if linked == account_id {
                let identity: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("resolve_by_account_id: {e}")))?;
                return Ok(identity);
            }
        }

        Err(IdentityError::NotFound {
            account_id: account_id.to_string(),
        })
    }
}
