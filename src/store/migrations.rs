//! Schema upgrades for the link database.
//!
//! Applied steps are recorded in `schema_history`. Each pending step runs
//! in its own transaction together with its history row, so a step is
//! either fully applied and recorded or not at all.

use std::collections::BTreeSet;

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

struct SchemaStep {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered schema steps. Append only.
const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "account_links",
    sql: "CREATE TABLE IF NOT EXISTS account_links (
              external_identity TEXT PRIMARY KEY,
              account_id TEXT NOT NULL,
              linked_at TEXT NOT NULL DEFAULT (datetime('now'))
          );",
}];

fn migration_err(context: &str, e: libsql::Error) -> DatabaseError {
    DatabaseError::Migration(format!("{context}: {e}"))
}

/// Bring the schema up to date.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_history (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| migration_err("create schema_history", e))?;

    let applied = applied_versions(conn).await?;
    for step in STEPS.iter().filter(|s| !applied.contains(&s.version)) {
        info!(version = step.version, name = step.name, "Upgrading schema");

        let tx = conn
            .transaction()
            .await
            .map_err(|e| migration_err("begin", e))?;
        tx.execute_batch(step.sql)
            .await
            .map_err(|e| migration_err(&format!("step {} ({})", step.version, step.name), e))?;
        tx.execute(
            "INSERT INTO schema_history (version, name) VALUES (?1, ?2)",
            libsql::params![step.version, step.name],
        )
        .await
        .map_err(|e| migration_err("record step", e))?;
        tx.commit().await.map_err(|e| migration_err("commit", e))?;
    }

    Ok(())
}

/// Versions already recorded in `schema_history`.
pub async fn applied_versions(conn: &Connection) -> Result<BTreeSet<i64>, DatabaseError> {
    let mut rows = conn
        .query("SELECT version FROM schema_history", ())
        .await
        .map_err(|e| migration_err("read schema_history", e))?;

    let mut versions = BTreeSet::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| migration_err("read schema_history", e))?
    {
        versions.insert(row.get::<i64>(0).map_err(|e| migration_err("decode version", e))?);
    }
    Ok(versions)
}
