use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::store::error::{StoreError, StoreResult};

/// Shared handle to the SQLite database.
///
/// All access goes through a single connection behind a mutex, so concurrent
/// writers (command handlers) serialize here and the uniqueness constraint on
/// subscriptions cannot be raced.
#[derive(Clone)]
pub struct SqliteStore {
    path: String,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    pub fn new(path: String) -> Self {
        Self {
            path,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Opens the database and applies the schema. Call once at startup.
    pub fn touch(&self) -> StoreResult<()> {
        self.with_connection(|_| Ok(()))
    }

    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::QueryFailed("connection mutex poisoned".to_string()))?;
        if guard.is_none() {
            let conn = Connection::open(&self.path)
                .map_err(|err| StoreError::OpenFailed(err.to_string()))?;
            migrate(&conn)?;
            *guard = Some(conn);
        }
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::OpenFailed("connection unavailable".to_string()))?;
        f(conn)
    }
}

fn migrate(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscriptions (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             server_id TEXT NOT NULL,
             channel_id TEXT NOT NULL,
             youtube_channel_id TEXT NOT NULL,
             UNIQUE(channel_id, youtube_channel_id)
         );",
    )
    .map_err(|err| StoreError::MigrationFailed(err.to_string()))
}
