use crate::{Result, StorageError, TemplateBackend, TEMPLATE_KEY};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedConnection = Arc<Mutex<Connection>>;

/// SQLite-backed primary store.
///
/// The synchronous accessors block on the connection; the async
/// [`TemplateBackend`] impl runs them on the blocking pool.
pub struct Database {
    conn: SharedConnection,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        tracing::debug!(path = %path.display(), "Opened template database");
        Ok(db)
    }

    /// Throwaway database, used by tests and the demo.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Read one setting, blocking on the connection.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        get_setting(&*lock(&self.conn)?, key)
    }

    /// Write one setting, blocking on the connection.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        set_setting(&*lock(&self.conn)?, key, value)
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&*lock(&conn)?))
            .await
            .map_err(|e| StorageError::Unavailable(format!("database task failed: {}", e)))?
    }
}

fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StorageError::Unavailable("database mutex poisoned".into()))
}

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        (key, value),
    )?;
    Ok(())
}

#[async_trait]
impl TemplateBackend for Database {
    async fn load(&self) -> Result<Option<String>> {
        self.with_connection(|conn| get_setting(conn, TEMPLATE_KEY))
            .await
    }

    async fn store(&self, value: &str) -> Result<()> {
        let value = value.to_string();
        self.with_connection(move |conn| set_setting(conn, TEMPLATE_KEY, &value))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_backend_calls_share_one_connection() {
        let db = Arc::new(Database::open_in_memory().unwrap());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let db = Arc::clone(&db);
                tokio::spawn(async move { db.store(&format!("Hi <name> #{i}")).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored = db.load().await.unwrap().unwrap();
        assert!(stored.starts_with("Hi <name> #"));
        assert_eq!(db.get_setting(TEMPLATE_KEY).unwrap(), Some(stored));
    }
}
