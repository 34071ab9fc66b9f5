//! SQLite storage backend for game snapshots and idempotency records.
//!
//! Snapshots are whole-game JSON documents written only after an action has
//! fully completed. The `turn_in_progress` guard is therefore never
//! persisted set: a crash between actions can never leave a stored game
//! stuck mid-action, which is the transaction-boundary obligation the
//! engine delegates to this layer.

use hexfront_core::{ActionResult, GameState, IdempotencyStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Snapshot schema version written with every saved game.
///
/// Bumped whenever the serialized [`GameState`] shape changes; loading a
/// snapshot written under a different version fails with
/// [`StorageError::SchemaMismatch`] instead of producing garbage state.
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite-based store for games and idempotency records.
///
/// Thread-safe wrapper around a SQLite connection; clones share the
/// underlying connection.
#[derive(Clone)]
pub struct GameStore {
    conn: Arc<Mutex<Connection>>,
}

/// Storage error types.
#[derive(Debug)]
pub enum StorageError {
    /// SQLite error.
    Sqlite(rusqlite::Error),
    /// Game not found.
    NotFound(String),
    /// Snapshot written under a different schema version.
    SchemaMismatch { found: u32, expected: u32 },
    /// Serialization error.
    Serialization(String),
    /// Lock error.
    LockError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "SQLite error: {}", e),
            StorageError::NotFound(id) => write!(f, "Game not found: {}", id),
            StorageError::SchemaMismatch { found, expected } => {
                write!(f, "Snapshot schema v{} does not match v{}", found, expected)
            }
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::LockError(msg) => write!(f, "Lock error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Sqlite(err)
    }
}

impl GameStore {
    /// Create a new store with an in-memory database.
    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Create a new store with a file-based database.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize the database schema.
    pub fn init_db(&self) -> Result<(), StorageError> {
        let conn = self.lock_conn()?;

        // Games table - one row per game, full snapshot JSON
        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                schema_version INTEGER NOT NULL,
                state_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Idempotency table - committed action results by composite key
        conn.execute(
            "CREATE TABLE IF NOT EXISTS idempotency (
                key TEXT PRIMARY KEY,
                result_json TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Persist a post-action snapshot of a game.
    pub fn save_game(&self, state: &GameState) -> Result<(), StorageError> {
        // The guard is scoped to a single in-flight action; a snapshot
        // always represents a game at rest
        let mut snapshot = state.clone();
        snapshot.turn_in_progress = false;

        let json = serde_json::to_string(&snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO games (id, schema_version, state_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                schema_version = ?2, state_json = ?3, updated_at = ?4",
            params![snapshot.id, SCHEMA_VERSION, json, unix_now()],
        )?;
        Ok(())
    }

    /// Load a game snapshot.
    pub fn load_game(&self, game_id: &str) -> Result<GameState, StorageError> {
        let conn = self.lock_conn()?;
        let row: Option<(u32, String)> = conn
            .query_row(
                "SELECT schema_version, state_json FROM games WHERE id = ?1",
                params![game_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (version, json) = row.ok_or_else(|| StorageError::NotFound(game_id.to_string()))?;
        if version != SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        let mut state: GameState = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        // The occupancy index is derived data; recompute it from the units
        // rather than trusting the snapshot
        state.rebuild_occupancy();
        state.turn_in_progress = false;
        Ok(state)
    }

    /// List ids of all stored games.
    pub fn list_game_ids(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT id FROM games ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Delete expired idempotency records.
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self, max_age: Duration) -> Result<usize, StorageError> {
        let cutoff = unix_now().saturating_sub(max_age.as_secs() as i64);
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM idempotency WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

impl IdempotencyStore for GameStore {
    fn try_get(&self, key: &str) -> Option<ActionResult> {
        let conn = self.lock_conn().ok()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT result_json FROM idempotency WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .ok()?;
        json.and_then(|j| serde_json::from_str(&j).ok())
    }

    fn put(&mut self, key: &str, result: &ActionResult) -> bool {
        let json = match serde_json::to_string(result) {
            Ok(j) => j,
            Err(_) => return false,
        };
        let conn = match self.lock_conn() {
            Ok(c) => c,
            Err(_) => return false,
        };
        // INSERT OR IGNORE: under a retry race the first writer wins and
        // the stored record is never overwritten
        conn.execute(
            "INSERT OR IGNORE INTO idempotency (key, result_json, created_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, unix_now()],
        )
        .map(|changed| changed > 0)
        .unwrap_or(false)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
