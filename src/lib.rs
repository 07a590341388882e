//! ExpensesDB - embedded storage layer for a personal expense tracker.
//!
//! Records of money transactions and their categories, kept in an embedded,
//! indexed, transactional database. Callers open a [`Database`] once, then go
//! through the [`MoneyTransactions`] and [`Categories`] facades; every
//! operation is asynchronous and reports its terminal outcome exactly once.

pub mod categories;
pub mod config;
pub mod connection;
pub mod models;
pub mod schema;
pub mod storage;
pub mod store;
pub mod transactions;

pub use categories::Categories;
pub use config::DbConfig;
pub use connection::Database;
pub use models::{
    Category, CategoryKey, CategoryPatch, EntryKind, MoneyTransaction, MoneyTransactionId,
    MoneyTransactionPatch,
};
pub use storage::StorageError;
pub use transactions::MoneyTransactions;
