//! Flat-file storage: one file per entity kind, rewritten whole on every save.

pub mod atomic;
pub mod cart;

use std::fs;
use std::io;
use std::path::PathBuf;

use mercato_common::auth::CredentialScheme;
use mercato_common::{Order, Product, Role, Transaction, User};
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::core::codec::{decode_stream, encode_all, Corruption, EntityKind, Record};
use crate::error::Result;

pub use atomic::{commit_all, temp_path, write_atomic, StagedWrite};
pub use cart::CartLoad;

/// Documented default administrator, created when no user file exists yet.
pub const BOOTSTRAP_ADMIN_ID: u32 = 1;
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin123";

/// Result of reading one entity file.
#[derive(Debug)]
pub struct LoadOutcome<R> {
    pub records: Vec<R>,
    /// Set when the file ended in a corrupt record; `records` holds
    /// everything before it.
    pub corruption: Option<Corruption>,
    /// False when the file did not exist.
    pub existed: bool,
}

/// All four collections as found on disk.
#[derive(Debug, Default)]
pub struct StoreSnapshot {
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub orders: Vec<Order>,
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<Corruption>,
    /// True when `users` holds a freshly synthesized administrator that has
    /// not been written yet.
    pub bootstrapped_admin: bool,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    config: LedgerConfig,
}

impl EntityStore {
    /// Validates the config and makes sure the data directory exists.
    pub fn open(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.config.file_for(kind)
    }

    /// Reads every record of kind `R`.
    ///
    /// A missing file is an empty collection. A corrupt record ends the load
    /// early and is reported, never raised; only I/O failures are errors.
    pub fn load_all<R: Record>(&self) -> Result<LoadOutcome<R>> {
        let path = self.path_for(R::KIND);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No {} file at {}, starting empty", R::KIND, path.display());
                return Ok(LoadOutcome {
                    records: Vec::new(),
                    corruption: None,
                    existed: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let (records, corruption) = decode_stream::<R>(&bytes);
        if let Some(c) = &corruption {
            warn!(
                "Corrupt data in {}: {}. Keeping {} earlier records",
                path.display(),
                c,
                records.len()
            );
        }
        info!("Loaded {} {} records from {}", records.len(), R::KIND, path.display());

        Ok(LoadOutcome {
            records,
            corruption,
            existed: true,
        })
    }

    /// Like [`load_all`](Self::load_all) for users, except that a missing
    /// file yields the bootstrap administrator.
    pub fn load_users(&self, scheme: &dyn CredentialScheme) -> Result<LoadOutcome<User>> {
        let mut outcome = self.load_all::<User>()?;
        if !outcome.existed {
            let admin = User::register(
                BOOTSTRAP_ADMIN_ID,
                BOOTSTRAP_ADMIN_USERNAME,
                BOOTSTRAP_ADMIN_PASSWORD,
                Role::Admin,
                scheme,
            )?;
            info!("Bootstrapped default administrator '{}'", BOOTSTRAP_ADMIN_USERNAME);
            outcome.records.push(admin);
        }
        Ok(outcome)
    }

    pub fn load_state(&self, scheme: &dyn CredentialScheme) -> Result<StoreSnapshot> {
        let products = self.load_all::<Product>()?;
        let users = self.load_users(scheme)?;
        let orders = self.load_all::<Order>()?;
        let transactions = self.load_all::<Transaction>()?;

        let warnings = [
            products.corruption,
            users.corruption,
            orders.corruption,
            transactions.corruption,
        ]
        .into_iter()
        .flatten()
        .collect();

        Ok(StoreSnapshot {
            products: products.records,
            bootstrapped_admin: !users.existed,
            users: users.records,
            orders: orders.records,
            transactions: transactions.records,
            warnings,
        })
    }

    /// Encodes `records` and writes them to the temporary file, leaving the
    /// committed file untouched. Encoding failures never reach the disk.
    pub fn stage<R: Record>(&self, records: &[R]) -> Result<StagedWrite> {
        let bytes = encode_all(records)?;
        let staged = StagedWrite::stage(self.path_for(R::KIND), &bytes)?;
        Ok(staged)
    }

    /// Atomically replaces the whole file of kind `R`.
    pub fn replace_all<R: Record>(&self, records: &[R]) -> Result<()> {
        self.stage(records)?.commit()?;
        info!("Saved {} {} records", records.len(), R::KIND);
        Ok(())
    }
}
