use std::fs;
use std::path::{Path, PathBuf};

use mercato_common::UserId;
use serde::{Deserialize, Serialize};

use crate::core::codec::EntityKind;
use crate::error::{LedgerError, Result};

/// Where the ledger keeps its files.
///
/// One data directory per running process; two processes pointed at the
/// same directory will overwrite each other's commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub products_file: String,
    pub users_file: String,
    pub orders_file: String,
    pub transactions_file: String,
    /// Cart snapshots are stored as `<cart_prefix><user id>.dat`.
    pub cart_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            products_file: "products.dat".to_string(),
            users_file: "users.dat".to_string(),
            orders_file: "orders.dat".to_string(),
            transactions_file: "transactions.dat".to_string(),
            cart_prefix: "cart_".to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn file_for(&self, kind: EntityKind) -> PathBuf {
        let name = match kind {
            EntityKind::Product => &self.products_file,
            EntityKind::User => &self.users_file,
            EntityKind::Order => &self.orders_file,
            EntityKind::Transaction => &self.transactions_file,
        };
        self.data_dir.join(name)
    }

    pub fn cart_path(&self, user_id: UserId) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.dat", self.cart_prefix, user_id))
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            &self.products_file,
            &self.users_file,
            &self.orders_file,
            &self.transactions_file,
        ];
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(LedgerError::Config("file names cannot be empty".to_string()));
            }
            if names[..i].contains(name) {
                return Err(LedgerError::Config(format!("file '{}' is used by two entity kinds", name)));
            }
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<LedgerConfig>(&data)
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_paths() {
        let config = LedgerConfig::default();
        assert_eq!(config.file_for(EntityKind::Product), PathBuf::from("data/products.dat"));
        assert_eq!(config.file_for(EntityKind::Transaction), PathBuf::from("data/transactions.dat"));
        assert_eq!(config.cart_path(7), PathBuf::from("data/cart_7.dat"));
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut config = LedgerConfig::with_data_dir(dir.path().join("store"));
        config.cart_prefix = "basket_".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = LedgerConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, r#"{ "data_dir": "elsewhere" }"#).unwrap();

        let loaded = LedgerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.data_dir, PathBuf::from("elsewhere"));
        assert_eq!(loaded.users_file, "users.dat");
    }

    #[test]
    fn test_rejects_shared_file_names() {
        let mut config = LedgerConfig::default();
        config.orders_file = config.products_file.clone();
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }
}
