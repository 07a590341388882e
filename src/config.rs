use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::schema;

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Database name; also names the on-disk file (`<name>.db`).
    #[serde(default = "default_name")]
    pub name: String,

    /// Requested schema version. Opening a database stored at a higher
    /// version fails; a lower stored version triggers the migrations.
    #[serde(default = "default_version")]
    pub version: i32,

    /// Directory holding the database file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Transient in-memory database; `name` and `data_dir` are ignored.
    #[serde(skip)]
    pub in_memory: bool,
}

fn default_name() -> String {
    "ExpensesDB".to_string()
}

fn default_version() -> i32 {
    schema::SCHEMA_VERSION
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            name: default_name(),
            version: default_version(),
            data_dir: default_data_dir(),
            in_memory: false,
        }
    }
}

impl DbConfig {
    /// Transient in-memory database, used by the test suites.
    pub fn in_memory() -> Self {
        DbConfig {
            in_memory: true,
            ..DbConfig::default()
        }
    }

    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file is missing or unparsable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to parse config file, using defaults");
                DbConfig::default()
            }),
            Err(_) => DbConfig::default(),
        }
    }

    pub(crate) fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DbConfig::default();
        assert_eq!(config.name, "ExpensesDB");
        assert_eq!(config.version, schema::SCHEMA_VERSION);
        assert_eq!(config.db_path(), PathBuf::from("./ExpensesDB.db"));
        assert!(!config.in_memory);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: DbConfig = toml::from_str("name = \"TestDB\"").unwrap();
        assert_eq!(config.name, "TestDB");
        assert_eq!(config.version, schema::SCHEMA_VERSION);
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = DbConfig::load("/nonexistent/expensedb.toml");
        assert_eq!(config.name, "ExpensesDB");
    }
}
