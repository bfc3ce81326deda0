//! `SQLite` storage for the circumvention policy.
//!
//! The policy is a handful of key/value rows. A missing row means the
//! value was never set (or was cleared).

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::error::{PolicyError, Result};
use super::types::{CircumventionPolicy, PolicyChange, PolicyKey};
use super::validate::{normalize_country_code, normalize_domain};

/// `SQLite`-based storage for policy rows.
///
/// Thread-safe wrapper around a `SQLite` connection.
pub struct PolicyStorage {
    conn: Mutex<Connection>,
}

impl PolicyStorage {
    /// Opens (or creates) the policy database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PolicyError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS circumvention_policy (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the persisted policy.
    ///
    /// Unknown keys are ignored. Stored values are re-validated, so a
    /// hand-edited database cannot smuggle in a malformed domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is invalid.
    pub fn load(&self) -> Result<CircumventionPolicy> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM circumvention_policy")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut policy = CircumventionPolicy::default();
        for (key, value) in rows {
            match PolicyKey::parse(&key) {
                Some(PolicyKey::ManuallyActivated) => {
                    policy.manually_activated = value.parse().map_err(|_| {
                        PolicyError::InvalidData(format!("{key} = {value}"))
                    })?;
                }
                Some(PolicyKey::ManualDomain) => {
                    let domain = normalize_domain(&value)
                        .map_err(|e| PolicyError::InvalidData(format!("{key}: {e}")))?;
                    policy.manual_domain = Some(domain);
                }
                Some(PolicyKey::ManualCountryCode) => {
                    let code = normalize_country_code(&value)
                        .map_err(|e| PolicyError::InvalidData(format!("{key}: {e}")))?;
                    policy.manual_country_code = Some(code);
                }
                None => {}
            }
        }

        Ok(policy)
    }

    /// Writes a single change.
    ///
    /// A change carrying `None` deletes the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn apply(&self, change: &PolicyChange) -> Result<()> {
        let conn = self.lock()?;
        let key = change.key().as_str();

        match change.stored_value() {
            Some(value) => {
                conn.execute(
                    r"
                    INSERT INTO circumvention_policy (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at
                    ",
                    params![key, value, chrono::Utc::now().timestamp()],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM circumvention_policy WHERE key = ?1",
                    params![key],
                )?;
            }
        }

        Ok(())
    }

    /// Returns when a key was last written, as a Unix timestamp.
    #[cfg(test)]
    fn updated_at(&self, key: PolicyKey) -> Result<Option<i64>> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;
        let updated_at = conn
            .query_row(
                "SELECT updated_at FROM circumvention_policy WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at)
    }

    #[cfg(test)]
    fn raw_insert(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO circumvention_policy (key, value, updated_at) VALUES (?1, ?2, 0)",
            params![key, value],
        )?;
        Ok(())
    }
}
