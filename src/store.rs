//! Generic record store: CRUD over any declared [`Collection`].
//!
//! Each operation is its own short-lived transaction against the one live
//! connection; transactions never span calls and never nest. No operation is
//! retried here; retry policy belongs to the caller.

use std::marker::PhantomData;

use rusqlite::{params_from_iter, types::Value, Connection};

use crate::{
    connection::Database,
    storage::{write_error, Collection, KeySpec, StorageError},
};

pub struct Store<C: Collection> {
    db: Database,
    _collection: PhantomData<C>,
}

impl<C: Collection> Clone for Store<C> {
    fn clone(&self) -> Self {
        Store {
            db: self.db.clone(),
            _collection: PhantomData,
        }
    }
}

impl<C: Collection> Store<C> {
    pub fn new(db: &Database) -> Self {
        Store {
            db: db.clone(),
            _collection: PhantomData,
        }
    }

    /// Inserts a record and returns its key, auto-generated or derived from
    /// the record per the collection's key strategy. A uniqueness/key
    /// constraint violation is `WriteFailed`.
    pub async fn add(&self, record: C::Record) -> Result<C::Key, StorageError> {
        self.db.with_conn(move |conn| insert::<C>(conn, &record)).await
    }

    /// Looks a record up by key; an absent key is `Ok(None)`, not an error.
    pub async fn get(&self, key: C::Key) -> Result<Option<C::Record>, StorageError> {
        self.db.with_conn(move |conn| select_one::<C>(conn, &key)).await
    }

    /// Full contents in the collection's native key order.
    pub async fn get_all(&self) -> Result<Vec<C::Record>, StorageError> {
        self.db.with_conn(|conn| select_all::<C>(conn)).await
    }

    /// Read-modify-write under one transaction: fetches the record, fails
    /// with `NotFound` if absent, applies the mutator, and puts the result
    /// back under the same key. The mutator must leave key-path fields
    /// untouched.
    pub async fn update<F>(&self, key: C::Key, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut C::Record) + Send + 'static,
    {
        self.db
            .with_conn(move |conn| update_in_place::<C>(conn, &key, mutate))
            .await
    }

    /// Deletes by key; removing an absent key succeeds.
    pub async fn remove(&self, key: C::Key) -> Result<(), StorageError> {
        self.db.with_conn(move |conn| delete::<C>(conn, &key)).await
    }

    /// Indexed lookup over one declared indexed column, in native key order.
    pub async fn find_by(
        &self,
        column: &'static str,
        value: Value,
    ) -> Result<Vec<C::Record>, StorageError> {
        if !C::INDEXED_COLUMNS.contains(&column) {
            return Err(StorageError::Other(format!(
                "column '{column}' of '{}' is not indexed",
                C::NAME
            )));
        }
        self.db
            .with_conn(move |conn| select_by::<C>(conn, column, &value))
            .await
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_predicate<C: Collection>(first_param: usize) -> String {
    C::KEY
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", first_param + i))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn key_order<C: Collection>() -> String {
    C::KEY.columns().join(", ")
}

fn insert<C: Collection>(conn: &Connection, record: &C::Record) -> Result<C::Key, StorageError> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        C::NAME,
        C::DATA_COLUMNS.join(", "),
        placeholders(C::DATA_COLUMNS.len()),
    );
    conn.execute(&sql, params_from_iter(C::data_values(record)))
        .map_err(write_error)?;

    let key = match C::KEY {
        KeySpec::AutoIncrement { .. } => C::key_from_rowid(conn.last_insert_rowid()),
        KeySpec::KeyPath { .. } => C::key_of(record),
    }
    .ok_or_else(|| StorageError::Other(format!("collection '{}' produced no key", C::NAME)))?;

    tracing::debug!(collection = C::NAME, "record added");
    Ok(key)
}

fn select_one<C: Collection>(
    conn: &Connection,
    key: &C::Key,
) -> Result<Option<C::Record>, StorageError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        C::DATA_COLUMNS.join(", "),
        C::NAME,
        key_predicate::<C>(1),
    );
    match conn.query_row(&sql, params_from_iter(C::key_values(key)), C::from_row) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Engine(e)),
    }
}

fn select_all<C: Collection>(conn: &Connection) -> Result<Vec<C::Record>, StorageError> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        C::DATA_COLUMNS.join(", "),
        C::NAME,
        key_order::<C>(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], C::from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StorageError::Engine)
}

fn select_by<C: Collection>(
    conn: &Connection,
    column: &str,
    value: &Value,
) -> Result<Vec<C::Record>, StorageError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {column} = ?1 ORDER BY {}",
        C::DATA_COLUMNS.join(", "),
        C::NAME,
        key_order::<C>(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([value], C::from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StorageError::Engine)
}

fn update_in_place<C: Collection>(
    conn: &mut Connection,
    key: &C::Key,
    mutate: impl FnOnce(&mut C::Record),
) -> Result<(), StorageError> {
    let tx = conn.transaction()?;

    let mut record = select_one::<C>(&tx, key)?.ok_or(StorageError::NotFound(C::NAME))?;
    mutate(&mut record);

    let assignments = C::DATA_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE {}",
        C::NAME,
        key_predicate::<C>(C::DATA_COLUMNS.len() + 1),
    );
    let params: Vec<Value> = C::data_values(&record)
        .into_iter()
        .chain(C::key_values(key))
        .collect();
    tx.execute(&sql, params_from_iter(params)).map_err(write_error)?;
    tx.commit()?;

    tracing::debug!(collection = C::NAME, "record updated");
    Ok(())
}

fn delete<C: Collection>(conn: &Connection, key: &C::Key) -> Result<(), StorageError> {
    let sql = format!("DELETE FROM {} WHERE {}", C::NAME, key_predicate::<C>(1));
    conn.execute(&sql, params_from_iter(C::key_values(key)))?;
    tracing::debug!(collection = C::NAME, "record removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DbConfig,
        models::{EntryKind, MoneyTransaction},
        transactions::MoneyTransactionsCollection,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn sample(concept: &str) -> MoneyTransaction {
        MoneyTransaction {
            concept: concept.to_string(),
            date: date!(2024 - 01 - 01),
            amount: dec!(10.00),
            category: "Misc".to_string(),
            kind: EntryKind::Expense,
        }
    }

    async fn store() -> Store<MoneyTransactionsCollection> {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        Store::new(&db)
    }

    #[tokio::test]
    async fn keys_are_assigned_in_sequence() {
        let store = store().await;
        let first = store.add(sample("a")).await.unwrap();
        let second = store.add(sample("b")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn update_applies_mutator_under_same_key() {
        let store = store().await;
        let key = store.add(sample("groceries")).await.unwrap();

        store
            .update(key, |record| record.amount = dec!(25.00))
            .await
            .unwrap();

        let record = store.get(key).await.unwrap().unwrap();
        assert_eq!(record.amount, dec!(25.00));
        assert_eq!(record.concept, "groceries");
    }

    #[tokio::test]
    async fn find_by_rejects_unindexed_columns() {
        let store = store().await;
        let err = store
            .find_by("id", Value::Integer(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Other(_)));
    }
}
