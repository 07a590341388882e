//! The connection manager: opens and owns the single database handle.
//!
//! A [`Database`] is an explicit object injected into stores and facades by
//! construction; cloning it shares the same underlying connection. Every
//! storage operation runs on the blocking pool and resolves its future
//! exactly once.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{config::DbConfig, schema, storage::StorageError};

#[derive(Clone, Debug)]
pub struct Database {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    conn: Mutex<Option<Connection>>,
    name: String,
}

impl Database {
    /// Opens the named database, running schema migrations when the stored
    /// version is below the requested one.
    ///
    /// The host capability check runs first, synchronously: if the data
    /// directory cannot be created or written, no open attempt is issued and
    /// the error is `UnsupportedEnvironment`. Open and upgrade failures
    /// surface as `ConnectionFailed`.
    pub async fn open(config: DbConfig) -> Result<Database, StorageError> {
        ensure_environment(&config)?;

        let name = config.name.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|e| StorageError::Other(e.to_string()))??;

        tracing::info!(db = %name, "database connection established");
        Ok(Database {
            inner: Arc::new(Inner {
                conn: Mutex::new(Some(conn)),
                name,
            }),
        })
    }

    /// Drops the underlying connection. Later operations through this handle
    /// (or any clone of it) fail with `NotInitialized`.
    pub fn close(&self) {
        let mut guard = self.inner.conn.lock().unwrap();
        if guard.take().is_some() {
            tracing::info!(db = %self.inner.name, "database connection closed");
        }
    }

    /// Runs one storage operation against the live connection on the
    /// blocking pool. Engine-level faults pass through to the caller and are
    /// additionally logged here, the handle-level error observer.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = inner.conn.lock().unwrap();
            let conn = guard.as_mut().ok_or(StorageError::NotInitialized)?;
            f(conn)
        })
        .await
        .map_err(|e| StorageError::Other(e.to_string()))?;

        if let Err(StorageError::Engine(err)) = &result {
            tracing::error!(db = %self.inner.name, error = %err, "storage engine error");
        }
        result
    }
}

/// Startup-time capability check, not a per-call one: the embedded engine
/// needs a creatable, writable data directory.
fn ensure_environment(config: &DbConfig) -> Result<(), StorageError> {
    if config.in_memory {
        return Ok(());
    }
    let dir = &config.data_dir;
    std::fs::create_dir_all(dir).map_err(|e| {
        StorageError::UnsupportedEnvironment(format!(
            "cannot create data directory {}: {e}",
            dir.display()
        ))
    })?;
    let probe = dir.join(".expensedb-probe");
    std::fs::write(&probe, b"")
        .and_then(|()| std::fs::remove_file(&probe))
        .map_err(|e| {
            StorageError::UnsupportedEnvironment(format!(
                "data directory {} is not writable: {e}",
                dir.display()
            ))
        })?;
    Ok(())
}

fn open_connection(config: &DbConfig) -> Result<Connection, StorageError> {
    let mut conn = if config.in_memory {
        Connection::open_in_memory()
    } else {
        Connection::open(config.db_path())
    }
    .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

    schema::apply_migrations(&mut conn, config.version).map_err(|e| match e {
        e @ StorageError::ConnectionFailed(_) => e,
        other => StorageError::ConnectionFailed(other.to_string()),
    })?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_applies_schema() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let tables: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('money_transactions', 'categories')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn closed_handle_is_not_initialized() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.close();

        let err = db.with_conn(|_| Ok(())).await.unwrap_err();
        assert!(matches!(err, StorageError::NotInitialized));
    }

    #[tokio::test]
    async fn unwritable_data_dir_is_unsupported_environment() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = DbConfig {
            data_dir: file.path().to_path_buf(),
            ..DbConfig::default()
        };

        let err = Database::open(config).await.unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedEnvironment(_)));
    }
}
