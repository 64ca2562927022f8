//! Local persisted state for bams.
//!
//! The dashboard keeps its client-side state (session, custom locations,
//! settings, admin accounts, edited recommendations) as JSON documents under
//! fixed string keys. This module stores those documents in `SQLite`.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Fixed keys under which dashboard state is persisted.
pub mod keys {
    /// Session token of the logged-in operator.
    pub const ADMIN_TOKEN: &str = "adminToken";
    /// Serialized profile of the logged-in operator.
    pub const ADMIN_DATA: &str = "adminData";
    /// Operator-added monitoring locations.
    pub const CUSTOM_LOCATIONS: &str = "bams_custom_locations";
    /// Operator-tunable system settings.
    pub const SYSTEM_SETTINGS: &str = "bams_system_settings";
    /// Operator-added admin accounts.
    pub const ADMIN_ACCOUNTS: &str = "bams_admin_accounts";
    /// Edited health recommendation bands.
    pub const RECOMMENDATIONS: &str = "bams_recommendations";

    /// Every key the dashboard writes.
    pub const ALL: &[&str] = &[
        ADMIN_TOKEN,
        ADMIN_DATA,
        CUSTOM_LOCATIONS,
        SYSTEM_SETTINGS,
        ADMIN_ACCOUNTS,
        RECOMMENDATIONS,
    ];
}

/// Key-value store backed by `SQLite`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Summary of what the store currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored keys.
    pub total_entries: i64,
    /// Most recent write, if any.
    pub last_modified: Option<DateTime<Utc>>,
    /// Size of the database file in bytes (0 for in-memory stores).
    pub db_size_bytes: u64,
}

impl Storage {
    /// Open or create a store at the given path.
    ///
    /// Creates parent directories as needed and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening local store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Local store opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store a raw string under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    /// Remove `key`. Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// Decode the JSON document stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored value is
    /// not valid JSON for `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }

    /// Decode a JSON list under `key`, treating an absent key as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or decoding fails.
    pub fn get_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.get_json::<Vec<T>>(key)?.unwrap_or_default())
    }

    /// All stored keys in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Remove every stored key.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM entries", [])?;
        if affected > 0 {
            info!("Cleared {} stored entries", affected);
        }
        Ok(affected)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_entries: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM entries ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let last_modified = newest
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok())
            .map(|naive| naive.and_utc());

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_entries,
            last_modified,
            db_size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let storage = create_test_storage();
        storage.set(keys::ADMIN_TOKEN, "mock-jwt-token-admin").unwrap();

        assert_eq!(
            storage.get(keys::ADMIN_TOKEN).unwrap().as_deref(),
            Some("mock-jwt-token-admin")
        );
    }

    #[test]
    fn test_get_missing() {
        let storage = create_test_storage();
        assert!(storage.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let storage = create_test_storage();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();

        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(storage.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let storage = create_test_storage();
        storage.set("k", "v").unwrap();

        assert!(storage.remove("k").unwrap());
        assert!(!storage.remove("k").unwrap());
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let storage = create_test_storage();
        let sample = Sample {
            name: "RSU Denpasar".to_string(),
            value: 45,
        };
        storage.set_json("sample", &sample).unwrap();

        let loaded: Sample = storage.get_json("sample").unwrap().unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_get_json_invalid_is_error() {
        let storage = create_test_storage();
        storage.set(keys::ADMIN_DATA, "{not json").unwrap();

        let result = storage.get_json::<Sample>(keys::ADMIN_DATA);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_get_list_absent_is_empty() {
        let storage = create_test_storage();
        let list: Vec<Sample> = storage.get_list(keys::CUSTOM_LOCATIONS).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let storage = create_test_storage();
        storage.set("b", "2").unwrap();
        storage.set("a", "1").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_clear() {
        let storage = create_test_storage();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        assert_eq!(storage.clear().unwrap(), 2);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_entries, 0);
        assert!(stats.last_modified.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage.set("a", "1").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 1);
        assert!(stats.last_modified.is_some());
    }

    #[test]
    fn test_unicode_value() {
        let storage = create_test_storage();
        storage.set("unit", "24.0 µg/m³").unwrap();
        assert_eq!(storage.get("unit").unwrap().as_deref(), Some("24.0 µg/m³"));
    }

    #[test]
    fn test_known_keys_are_distinct() {
        let mut all = keys::ALL.to_vec();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), keys::ALL.len());
    }

    #[test]
    fn test_open_file_based_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("bams.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage.set(keys::SYSTEM_SETTINGS, "{}").unwrap();
        }

        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(
            storage.get(keys::SYSTEM_SETTINGS).unwrap().as_deref(),
            Some("{}")
        );
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("bams.db");

        let storage = Storage::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
    }
}
