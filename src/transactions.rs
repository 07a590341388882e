//! Money transaction facade over the generic record store.

use std::str::FromStr;

use rust_decimal::Decimal;
use rusqlite::{types::Value, Row};

use crate::{
    connection::Database,
    models::{
        column_error, date_to_str, str_to_date, EntryKind, MoneyTransaction, MoneyTransactionId,
        MoneyTransactionPatch,
    },
    storage::{Collection, KeySpec, StorageError},
    store::Store,
};

/// Schema binding for the `money_transactions` collection.
pub struct MoneyTransactionsCollection;

impl Collection for MoneyTransactionsCollection {
    const NAME: &'static str = "money_transactions";
    const KEY: KeySpec = KeySpec::AutoIncrement { column: "id" };
    const DATA_COLUMNS: &'static [&'static str] =
        &["concept", "date", "amount", "category", "type"];
    const INDEXED_COLUMNS: &'static [&'static str] =
        &["concept", "date", "amount", "category", "type"];

    type Key = MoneyTransactionId;
    type Record = MoneyTransaction;

    fn data_values(record: &MoneyTransaction) -> Vec<Value> {
        vec![
            Value::Text(record.concept.clone()),
            Value::Text(date_to_str(record.date)),
            Value::Text(record.amount.to_string()),
            Value::Text(record.category.clone()),
            Value::Text(record.kind.as_str().to_string()),
        ]
    }

    fn key_values(key: &MoneyTransactionId) -> Vec<Value> {
        vec![Value::Integer(*key)]
    }

    fn key_from_rowid(rowid: i64) -> Option<MoneyTransactionId> {
        Some(rowid)
    }

    fn key_of(_record: &MoneyTransaction) -> Option<MoneyTransactionId> {
        None
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<MoneyTransaction> {
        let date: String = row.get(1)?;
        let amount: String = row.get(2)?;
        let kind: String = row.get(4)?;
        Ok(MoneyTransaction {
            concept: row.get(0)?,
            date: str_to_date(&date).map_err(|e| column_error(1, e))?,
            amount: Decimal::from_str(&amount).map_err(|e| column_error(2, e.to_string()))?,
            category: row.get(3)?,
            kind: EntryKind::parse(&kind)
                .ok_or_else(|| column_error(4, format!("unknown entry kind '{kind}'")))?,
        })
    }
}

#[derive(Clone)]
pub struct MoneyTransactions {
    store: Store<MoneyTransactionsCollection>,
}

impl MoneyTransactions {
    pub fn new(db: &Database) -> Self {
        MoneyTransactions {
            store: Store::new(db),
        }
    }

    pub async fn add(
        &self,
        transaction: MoneyTransaction,
    ) -> Result<MoneyTransactionId, StorageError> {
        self.store.add(transaction).await
    }

    pub async fn get(
        &self,
        id: MoneyTransactionId,
    ) -> Result<Option<MoneyTransaction>, StorageError> {
        self.store.get(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<MoneyTransaction>, StorageError> {
        self.store.get_all().await
    }

    pub async fn update(
        &self,
        id: MoneyTransactionId,
        patch: MoneyTransactionPatch,
    ) -> Result<(), StorageError> {
        self.store.update(id, move |record| patch.apply(record)).await
    }

    pub async fn remove(&self, id: MoneyTransactionId) -> Result<(), StorageError> {
        self.store.remove(id).await
    }

    /// Transactions referencing the named category, via the `category` index.
    pub async fn find_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<MoneyTransaction>, StorageError> {
        self.store
            .find_by("category", Value::Text(category.to_string()))
            .await
    }

    /// All income or all expense transactions, via the `type` index.
    pub async fn find_by_kind(
        &self,
        kind: EntryKind,
    ) -> Result<Vec<MoneyTransaction>, StorageError> {
        self.store
            .find_by("type", Value::Text(kind.as_str().to_string()))
            .await
    }
}
