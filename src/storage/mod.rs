//! Persistent client-side storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - Stable player identity, generated once per device
//! - The active room id, kept only for the lifetime of one room

use directories::ProjectDirs;
use rand::Rng;
use rusqlite::{params, Connection};
use std::path::PathBuf;

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: Initial schema with the single-row meta table
const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Database error from SQLite
    Database(rusqlite::Error),
    /// Could not determine data directory
    NoDataDirectory,
    /// Schema version mismatch (future version)
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Failed to create data directory
    CreateDirFailed(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "database error: {}", e),
            StorageError::NoDataDirectory => write!(f, "could not determine data directory"),
            StorageError::FutureSchemaVersion { found, supported } => {
                write!(
                    f,
                    "database schema version {} is newer than supported version {}",
                    found, supported
                )
            }
            StorageError::CreateDirFailed(e) => write!(f, "failed to create data directory: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e)
    }
}

/// A stable identifier for the local player.
///
/// The server attributes finds and scores to this id, so it must survive
/// restarts. Format: `user_` followed by 9 random base36 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl PlayerId {
    /// Generate a new random player id.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..9)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();
        PlayerId(format!("user_{}", suffix))
    }

    /// Wrap an already-persisted id.
    pub fn from_string(s: String) -> Self {
        PlayerId(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The main storage handle for wordrace client data.
pub struct Storage {
    conn: Connection,
    player_id: PlayerId,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses OS-standard directories:
    /// - Linux: `$XDG_DATA_HOME/wordrace/` or `~/.local/share/wordrace/`
    /// - macOS: `~/Library/Application Support/wordrace/`
    pub fn open() -> Result<Self, StorageError> {
        let data_dir = Self::data_dir()?;

        // Ensure directory exists
        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let db_path = data_dir.join("wordrace.db");
        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// Used by tests, and as the degraded mode when the data directory is
    /// unavailable: the identity then lives only for this process, which
    /// breaks rejoin-after-restart but nothing else.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Open the on-disk database, falling back to an ephemeral in-memory one.
    pub fn open_or_ephemeral() -> Result<Self, StorageError> {
        match Self::open() {
            Ok(storage) => Ok(storage),
            Err(_) => Self::open_in_memory(),
        }
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        let mut storage = Storage {
            conn,
            player_id: PlayerId(String::new()), // Placeholder, will be loaded/created
        };
        storage.initialize_schema()?;
        storage.player_id = storage.load_or_create_player_id()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory for wordrace.
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "wordrace")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    /// Get this device's player id.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Persist the active room id.
    pub fn save_room(&self, room_id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("UPDATE meta SET room_id = ?1", params![room_id])?;
        Ok(())
    }

    /// Get the saved room id, if a room is still active.
    pub fn load_room(&self) -> Result<Option<String>, StorageError> {
        let room: Option<String> = self
            .conn
            .query_row("SELECT room_id FROM meta LIMIT 1", [], |row| row.get(0))?;
        Ok(room)
    }

    /// Forget the saved room id.
    pub fn clear_room(&self) -> Result<(), StorageError> {
        self.conn.execute("UPDATE meta SET room_id = NULL", [])?;
        Ok(())
    }

    // Private helper methods

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            // Fresh database, create schema
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            // Database is from a newer version of the client
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        // Check if meta table exists
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: u32 = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(version)
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            -- Meta table: single row holding identity and session state.
            -- player_id never changes once written; room_id is NULL whenever
            -- no room is active.
            CREATE TABLE meta (
                schema_version INTEGER NOT NULL,
                player_id TEXT NOT NULL,
                room_id TEXT,
                created_at INTEGER NOT NULL
            );
            "#,
        )?;

        let player_id = PlayerId::generate();
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        self.conn.execute(
            "INSERT INTO meta (schema_version, player_id, room_id, created_at) VALUES (?1, ?2, NULL, ?3)",
            params![SCHEMA_VERSION, player_id.as_str(), created_at],
        )?;

        Ok(())
    }

    fn load_or_create_player_id(&self) -> Result<PlayerId, StorageError> {
        let id: String = self
            .conn
            .query_row("SELECT player_id FROM meta LIMIT 1", [], |row| row.get(0))?;
        Ok(PlayerId::from_string(id))
    }
}
