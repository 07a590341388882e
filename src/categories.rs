//! Category facade over the generic record store.
//!
//! Categories live under the composite natural key `(name, type)`, passed
//! explicitly as a [`CategoryKey`] rather than a bare scalar.

use rusqlite::{types::Value, Row};

use crate::{
    connection::Database,
    models::{column_error, Category, CategoryKey, CategoryPatch, EntryKind},
    storage::{Collection, KeySpec, StorageError},
    store::Store,
};

/// Schema binding for the `categories` collection.
pub struct CategoriesCollection;

impl Collection for CategoriesCollection {
    const NAME: &'static str = "categories";
    const KEY: KeySpec = KeySpec::KeyPath {
        columns: &["name", "type"],
    };
    const DATA_COLUMNS: &'static [&'static str] = &["name", "type", "icon", "color"];
    const INDEXED_COLUMNS: &'static [&'static str] = &["name", "icon", "type", "color"];

    type Key = CategoryKey;
    type Record = Category;

    fn data_values(record: &Category) -> Vec<Value> {
        vec![
            Value::Text(record.name.clone()),
            Value::Text(record.kind.as_str().to_string()),
            Value::Text(record.icon.clone()),
            Value::Text(record.color.clone()),
        ]
    }

    fn key_values(key: &CategoryKey) -> Vec<Value> {
        vec![
            Value::Text(key.name.clone()),
            Value::Text(key.kind.as_str().to_string()),
        ]
    }

    fn key_from_rowid(_rowid: i64) -> Option<CategoryKey> {
        None
    }

    fn key_of(record: &Category) -> Option<CategoryKey> {
        Some(CategoryKey {
            name: record.name.clone(),
            kind: record.kind,
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
        let kind: String = row.get(1)?;
        Ok(Category {
            name: row.get(0)?,
            kind: EntryKind::parse(&kind)
                .ok_or_else(|| column_error(1, format!("unknown entry kind '{kind}'")))?,
            icon: row.get(2)?,
            color: row.get(3)?,
        })
    }
}

#[derive(Clone)]
pub struct Categories {
    store: Store<CategoriesCollection>,
}

impl Categories {
    pub fn new(db: &Database) -> Self {
        Categories {
            store: Store::new(db),
        }
    }

    /// Inserts a category; a duplicate `(name, type)` pair is `WriteFailed`.
    pub async fn add(&self, category: Category) -> Result<CategoryKey, StorageError> {
        self.store.add(category).await
    }

    pub async fn get(&self, key: CategoryKey) -> Result<Option<Category>, StorageError> {
        self.store.get(key).await
    }

    pub async fn get_all(&self) -> Result<Vec<Category>, StorageError> {
        self.store.get_all().await
    }

    pub async fn update(
        &self,
        key: CategoryKey,
        patch: CategoryPatch,
    ) -> Result<(), StorageError> {
        self.store.update(key, move |record| patch.apply(record)).await
    }

    pub async fn remove(&self, key: CategoryKey) -> Result<(), StorageError> {
        self.store.remove(key).await
    }

    /// All income or all expense categories, via the `type` index.
    pub async fn find_by_kind(&self, kind: EntryKind) -> Result<Vec<Category>, StorageError> {
        self.store
            .find_by("type", Value::Text(kind.as_str().to_string()))
            .await
    }
}
