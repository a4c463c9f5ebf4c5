use rusqlite::{params, Connection};

use crate::store::db::SqliteStore;
use crate::store::error::{StoreError, StoreResult};

/// One registered (destination channel, watched channel) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub server_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
}

/// Durable registry of subscriptions. Identity is the
/// (channel_id, youtube_channel_id) pair, enforced by a UNIQUE constraint.
#[derive(Clone)]
pub struct SubscriptionStore {
    store: SqliteStore,
}

impl SubscriptionStore {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Inserts a subscription. Returns `false` (not an error) when the pair
    /// is already registered.
    pub fn add(
        &self,
        server_id: &str,
        channel_id: &str,
        youtube_channel_id: &str,
    ) -> StoreResult<bool> {
        self.store.with_connection(|conn| {
            let result = conn.execute(
                "INSERT INTO subscriptions (server_id, channel_id, youtube_channel_id)
                 VALUES (?1, ?2, ?3)",
                params![server_id, channel_id, youtube_channel_id],
            );
            match result {
                Ok(_) => Ok(true),
                Err(err) if is_unique_violation(&err) => Ok(false),
                Err(err) => Err(StoreError::QueryFailed(err.to_string())),
            }
        })
    }

    /// Deletes the matching subscription. Returns `true` iff a row was
    /// actually removed.
    pub fn remove(&self, channel_id: &str, youtube_channel_id: &str) -> StoreResult<bool> {
        self.store.with_connection(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM subscriptions WHERE channel_id = ?1 AND youtube_channel_id = ?2",
                    params![channel_id, youtube_channel_id],
                )
                .map_err(|err| StoreError::QueryFailed(err.to_string()))?;
            Ok(deleted > 0)
        })
    }

    /// Every watched channel with at least one active subscriber.
    pub fn watched_channels(&self) -> StoreResult<Vec<String>> {
        self.store.with_connection(|conn| {
            collect_strings(
                conn,
                "SELECT DISTINCT youtube_channel_id FROM subscriptions",
                &[],
            )
        })
    }

    /// All destination channels subscribed to the given watched channel.
    pub fn subscribers_of(&self, youtube_channel_id: &str) -> StoreResult<Vec<String>> {
        self.store.with_connection(|conn| {
            collect_strings(
                conn,
                "SELECT channel_id FROM subscriptions WHERE youtube_channel_id = ?1",
                &[youtube_channel_id],
            )
        })
    }

    pub fn list(&self, channel_id: &str) -> StoreResult<Vec<Subscription>> {
        self.store.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT server_id, channel_id, youtube_channel_id
                     FROM subscriptions WHERE channel_id = ?1 ORDER BY id ASC",
                )
                .map_err(|err| StoreError::QueryFailed(err.to_string()))?;
            let rows = stmt
                .query_map([channel_id], |row| {
                    Ok(Subscription {
                        server_id: row.get(0)?,
                        channel_id: row.get(1)?,
                        youtube_channel_id: row.get(2)?,
                    })
                })
                .map_err(|err| StoreError::QueryFailed(err.to_string()))?;
            let mut subscriptions = Vec::new();
            for row in rows {
                subscriptions.push(row.map_err(|err| StoreError::QueryFailed(err.to_string()))?);
            }
            Ok(subscriptions)
        })
    }
}

fn collect_strings(conn: &Connection, sql: &str, args: &[&str]) -> StoreResult<Vec<String>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|err| StoreError::QueryFailed(err.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args), |row| {
            row.get::<_, String>(0)
        })
        .map_err(|err| StoreError::QueryFailed(err.to_string()))?;
    let mut values = Vec::new();
    for row in rows {
        values.push(row.map_err(|err| StoreError::QueryFailed(err.to_string()))?);
    }
    Ok(values)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    // Only a UNIQUE failure means "already registered"; other constraint
    // violations stay errors.
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
