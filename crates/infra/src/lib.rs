//! Infrastructure layer: local key-value persistence, the persistent ledger
//! wrapper, configuration.

pub mod config;
pub mod persistent;
pub mod storage;

mod integration_tests;

pub use config::{ConfigError, TallyConfig};
pub use persistent::{LedgerError, LedgerOptions, PersistentLedger, CUSTOMERS_KEY, TRANSACTIONS_KEY};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, JsonStore, KeyValueStore, StorageError, StorageResult};
