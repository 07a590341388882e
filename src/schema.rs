//! Collection and index definitions, applied only during version upgrades.
//!
//! The stored schema version lives in SQLite's `user_version` pragma. The
//! whole upgrade runs in a single transaction; any DDL failure aborts it and
//! the connection manager reports the open attempt as failed.

use rusqlite::Connection;

use crate::storage::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub(crate) fn apply_migrations(conn: &mut Connection, target: i32) -> Result<(), StorageError> {
    let current = schema_version(conn)?;
    if current == target {
        return Ok(());
    }
    if current > target {
        return Err(StorageError::ConnectionFailed(format!(
            "stored schema version {current} is newer than requested version {target}"
        )));
    }

    let tx = conn.transaction()?;
    if current < 1 {
        migrate_v1(&tx)?;
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;

    tracing::info!(from = current, to = target, "schema upgraded");
    Ok(())
}

pub(crate) fn schema_version(conn: &Connection) -> Result<i32, StorageError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn migrate_v1(conn: &Connection) -> Result<(), StorageError> {
    tracing::info!("running migration v1: initial collections");

    // Auto-increment key; the record carries no key field of its own.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS money_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            concept TEXT NOT NULL,
            date TEXT NOT NULL,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            type TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_money_transactions_concept
            ON money_transactions(concept);
        CREATE INDEX IF NOT EXISTS idx_money_transactions_date
            ON money_transactions(date);
        CREATE INDEX IF NOT EXISTS idx_money_transactions_amount
            ON money_transactions(amount);
        CREATE INDEX IF NOT EXISTS idx_money_transactions_category
            ON money_transactions(category);
        CREATE INDEX IF NOT EXISTS idx_money_transactions_type
            ON money_transactions(type);
        ",
    )?;

    // Composite natural key: a category name may repeat across kinds but not
    // within one.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS categories (
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            PRIMARY KEY (name, type)
        );

        CREATE INDEX IF NOT EXISTS idx_categories_name ON categories(name);
        CREATE INDEX IF NOT EXISTS idx_categories_icon ON categories(icon);
        CREATE INDEX IF NOT EXISTS idx_categories_type ON categories(type);
        CREATE INDEX IF NOT EXISTS idx_categories_color ON categories(color);
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(conn: &Connection, kind: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%'",
            [kind],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn migration_creates_collections_and_indexes() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn, SCHEMA_VERSION).unwrap();

        assert_eq!(count(&conn, "table"), 2);
        assert_eq!(count(&conn, "index"), 9);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn migration_is_idempotent_at_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn, SCHEMA_VERSION).unwrap();
        apply_migrations(&mut conn, SCHEMA_VERSION).unwrap();
        assert_eq!(count(&conn, "table"), 2);
    }

    #[test]
    fn version_regression_is_a_connection_failure() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn, SCHEMA_VERSION).unwrap();

        let err = apply_migrations(&mut conn, 0).unwrap_err();
        assert!(matches!(err, StorageError::ConnectionFailed(_)));
    }
}
