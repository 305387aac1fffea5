//! SQLite implementation of the PermissionStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use tether_core::FriendCode;
use tether_perms::{
    ElevatedPermissions, PermissionSet, PrimaryPermissions, RawPermissions, Relationship,
    ResolvedPermissions, SpeakPermissions, UserPermissions,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{PermissionStore, UpsertResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqlitePermissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePermissionStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
    }
}

fn global_from_row(
    row: &rusqlite::Row<'_>,
    offset: usize,
) -> rusqlite::Result<ResolvedPermissions> {
    Ok(PermissionSet::new(
        PrimaryPermissions::from_bits_truncate(row.get(offset)?),
        SpeakPermissions::from_bits_truncate(row.get(offset + 1)?),
        ElevatedPermissions::from_bits_truncate(row.get(offset + 2)?),
    ))
}

fn overrides_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<RawPermissions> {
    Ok(RawPermissions {
        primary_allow: PrimaryPermissions::from_bits_truncate(row.get(offset)?),
        primary_deny: PrimaryPermissions::from_bits_truncate(row.get(offset + 1)?),
        speak_allow: SpeakPermissions::from_bits_truncate(row.get(offset + 2)?),
        speak_deny: SpeakPermissions::from_bits_truncate(row.get(offset + 3)?),
        elevated_allow: ElevatedPermissions::from_bits_truncate(row.get(offset + 4)?),
        elevated_deny: ElevatedPermissions::from_bits_truncate(row.get(offset + 5)?),
    })
}

fn parse_code(raw: String) -> Result<FriendCode> {
    FriendCode::new(raw).map_err(|e| StoreError::InvalidData(e.to_string()))
}

const OVERRIDE_COLUMNS: &str =
    "primary_allow, primary_deny, speak_allow, speak_deny, elevated_allow, elevated_deny";

#[async_trait]
impl PermissionStore for SqlitePermissionStore {
    async fn get_global(&self, owner: &FriendCode) -> Result<Option<ResolvedPermissions>> {
        let owner = owner.clone();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT primary_bits, speak_bits, elevated_bits
                 FROM accounts WHERE friend_code = ?1",
                params![owner.as_str()],
                |row| global_from_row(row, 0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn set_global(&self, owner: &FriendCode, global: &ResolvedPermissions) -> Result<()> {
        let owner = owner.clone();
        let global = *global;
        self.blocking(move |conn| {
            let now = now_millis();
            conn.execute(
                "INSERT INTO accounts
                    (friend_code, primary_bits, speak_bits, elevated_bits, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(friend_code) DO UPDATE SET
                    primary_bits = excluded.primary_bits,
                    speak_bits = excluded.speak_bits,
                    elevated_bits = excluded.elevated_bits,
                    updated_at = excluded.updated_at",
                params![
                    owner.as_str(),
                    global.primary.bits(),
                    global.speak.bits(),
                    global.elevated.bits(),
                    now,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_permissions(
        &self,
        owner: &FriendCode,
    ) -> Result<HashMap<FriendCode, UserPermissions>> {
        let owner = owner.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT friend, {OVERRIDE_COLUMNS} FROM permissions WHERE owner = ?1"
            ))?;

            let rows = stmt
                .query_map(params![owner.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, overrides_from_row(row, 1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut edges = HashMap::with_capacity(rows.len());
            for (friend, overrides) in rows {
                let friend = parse_code(friend)?;
                edges.insert(
                    friend.clone(),
                    UserPermissions {
                        owner: owner.clone(),
                        friend,
                        overrides,
                    },
                );
            }
            Ok(edges)
        })
        .await
    }

    async fn get_user_permissions(
        &self,
        owner: &FriendCode,
        friend: &FriendCode,
    ) -> Result<Option<UserPermissions>> {
        let owner = owner.clone();
        let friend = friend.clone();
        self.blocking(move |conn| {
            let sql = format!(
                "SELECT {OVERRIDE_COLUMNS} FROM permissions \
                 WHERE owner = ?1 AND friend = ?2"
            );
            let overrides = conn
                .query_row(
                    &sql,
                    params![owner.as_str(), friend.as_str()],
                    |row| overrides_from_row(row, 0),
                )
                .optional()?;

            Ok(overrides.map(|overrides| UserPermissions {
                owner,
                friend,
                overrides,
            }))
        })
        .await
    }

    async fn upsert_permissions(&self, edge: &UserPermissions) -> Result<UpsertResult> {
        let edge = edge.clone();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let exists = tx
                .query_row(
                    "SELECT 1 FROM permissions WHERE owner = ?1 AND friend = ?2",
                    params![edge.owner.as_str(), edge.friend.as_str()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            let o = &edge.overrides;
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO permissions
                        (owner, friend, {OVERRIDE_COLUMNS}, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    edge.owner.as_str(),
                    edge.friend.as_str(),
                    o.primary_allow.bits(),
                    o.primary_deny.bits(),
                    o.speak_allow.bits(),
                    o.speak_deny.bits(),
                    o.elevated_allow.bits(),
                    o.elevated_deny.bits(),
                    now_millis(),
                ],
            )?;
            tx.commit()?;

            Ok(if exists {
                UpsertResult::Updated
            } else {
                UpsertResult::Inserted
            })
        })
        .await
    }

    async fn remove_permissions(&self, owner: &FriendCode, friend: &FriendCode) -> Result<bool> {
        let owner = owner.clone();
        let friend = friend.clone();
        self.blocking(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM permissions WHERE owner = ?1 AND friend = ?2",
                params![owner.as_str(), friend.as_str()],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn get_relationship(
        &self,
        grantor: &FriendCode,
        grantee: &FriendCode,
    ) -> Result<Option<Relationship>> {
        let grantor = grantor.clone();
        let grantee = grantee.clone();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT COALESCE(a.primary_bits, 0), COALESCE(a.speak_bits, 0),
                        COALESCE(a.elevated_bits, 0),
                        p.primary_allow, p.primary_deny, p.speak_allow, p.speak_deny,
                        p.elevated_allow, p.elevated_deny
                 FROM permissions p
                 LEFT JOIN accounts a ON a.friend_code = p.owner
                 WHERE p.owner = ?1 AND p.friend = ?2",
                params![grantor.as_str(), grantee.as_str()],
                |row| {
                    Ok(Relationship::new(
                        global_from_row(row, 0)?,
                        overrides_from_row(row, 3)?,
                    ))
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }
}
