//! Durable storage for sealed credentials.

use super::VaultError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One stored credential row. The value column holds the sealed blob only;
/// plaintext never touches disk.
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub provider: String,
    pub sealed_value: String,
    pub created_at: i64,
}

pub struct SecretStore {
    conn: Mutex<Connection>,
}

impl SecretStore {
    pub fn open(path: &Path) -> Result<Self, VaultError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| VaultError::Internal(format!("cannot create vault directory: {e}")))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, VaultError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), VaultError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS secrets (
                provider     TEXT PRIMARY KEY,
                sealed_value TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, VaultError> {
        self.conn.lock().map_err(|_| VaultError::Poisoned)
    }

    pub fn upsert(&self, provider: &str, sealed_value: &str) -> Result<(), VaultError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO secrets (provider, sealed_value, created_at) VALUES (?1, ?2, ?3)",
            params![provider, sealed_value, epoch_millis()],
        )?;
        Ok(())
    }

    pub fn get(&self, provider: &str) -> Result<Option<SecretRecord>, VaultError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT provider, sealed_value, created_at FROM secrets WHERE provider = ?1",
                params![provider],
                |row| {
                    Ok(SecretRecord {
                        provider: row.get(0)?,
                        sealed_value: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn delete(&self, provider: &str) -> Result<bool, VaultError> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM secrets WHERE provider = ?1", params![provider])?;
        Ok(changed > 0)
    }

    pub fn list(&self) -> Result<Vec<String>, VaultError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT provider FROM secrets ORDER BY provider")?;
        let providers = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(providers)
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_and_stamps() {
        let store = SecretStore::in_memory().unwrap();
        store.upsert("acme", "blob-one").unwrap();
        store.upsert("acme", "blob-two").unwrap();

        let record = store.get("acme").unwrap().unwrap();
        assert_eq!(record.sealed_value, "blob-two");
        assert!(record.created_at > 0);
        assert_eq!(store.list().unwrap(), vec!["acme".to_string()]);
    }

    #[test]
    fn delete_reports_existence() {
        let store = SecretStore::in_memory().unwrap();
        store.upsert("acme", "blob").unwrap();
        assert!(store.delete("acme").unwrap());
        assert!(!store.delete("acme").unwrap());
        assert!(store.get("acme").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted() {
        let store = SecretStore::in_memory().unwrap();
        store.upsert("zeta", "b1").unwrap();
        store.upsert("alpha", "b2").unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
