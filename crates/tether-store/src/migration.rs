//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied permission store migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: accounts and permission edges.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per account: the owner's global defaults
        CREATE TABLE accounts (
            friend_code TEXT PRIMARY KEY,
            primary_bits INTEGER NOT NULL DEFAULT 0,
            speak_bits INTEGER NOT NULL DEFAULT 0,
            elevated_bits INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Directed edges: what owner has granted friend
        CREATE TABLE permissions (
            owner TEXT NOT NULL,
            friend TEXT NOT NULL,
            primary_allow INTEGER NOT NULL DEFAULT 0,
            primary_deny INTEGER NOT NULL DEFAULT 0,
            speak_allow INTEGER NOT NULL DEFAULT 0,
            speak_deny INTEGER NOT NULL DEFAULT 0,
            elevated_allow INTEGER NOT NULL DEFAULT 0,
            elevated_deny INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (owner, friend)
        );
        "#,
    )?;

    Ok(())
}

/// Migration v2: reverse lookup index (who has added me).
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE INDEX idx_permissions_friend ON permissions(friend);")?;
    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
