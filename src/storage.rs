use rusqlite::{types::Value, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("embedded database unavailable: {0}")]
    UnsupportedEnvironment(String),
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),
    #[error("database not initialized")]
    NotInitialized,
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("no record found in '{0}' for the given key")]
    NotFound(&'static str),
    #[error("storage engine error: {0}")]
    Engine(#[from] rusqlite::Error),
    #[error("{0}")]
    Other(String),
}

/// How a collection derives the key of a newly inserted record.
#[derive(Debug, Clone, Copy)]
pub enum KeySpec {
    /// The engine assigns a monotonically increasing integer key.
    AutoIncrement { column: &'static str },
    /// The key is read from the named fields of the record itself.
    KeyPath { columns: &'static [&'static str] },
}

impl KeySpec {
    pub fn columns(&self) -> &[&'static str] {
        match self {
            KeySpec::AutoIncrement { column } => std::slice::from_ref(column),
            KeySpec::KeyPath { columns } => columns,
        }
    }
}

/// Compile-time declaration of an object collection: its name, key strategy,
/// columns, and how records map to and from engine rows.
///
/// Collections and their indexes are created by the schema migrations only;
/// at runtime this trait drives the generic [`Store`](crate::store::Store).
pub trait Collection: Send + Sync + 'static {
    const NAME: &'static str;
    const KEY: KeySpec;
    /// Record fields in declaration order, excluding any engine-assigned key.
    const DATA_COLUMNS: &'static [&'static str];
    /// Columns covered by a secondary index, available to indexed lookups.
    const INDEXED_COLUMNS: &'static [&'static str];

    type Key: Clone + Send + Sync + 'static;
    type Record: Clone + Send + Sync + 'static;

    fn data_values(record: &Self::Record) -> Vec<Value>;
    fn key_values(key: &Self::Key) -> Vec<Value>;
    /// Key of a freshly inserted record for auto-increment collections.
    fn key_from_rowid(rowid: i64) -> Option<Self::Key>;
    /// Key derived from the record for key-path collections.
    fn key_of(record: &Self::Record) -> Option<Self::Key>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self::Record>;
}

/// Classifies an engine failure on a write: uniqueness/key constraint
/// violations are recoverable (`WriteFailed`), everything else is an
/// engine fault.
pub(crate) fn write_error(err: rusqlite::Error) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(f, msg)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::WriteFailed(msg.unwrap_or_else(|| f.to_string()))
        }
        other => StorageError::Engine(other),
    }
}
