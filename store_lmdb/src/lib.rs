//! LMDB storage backend for the Boostly ledger.
//!
//! Implements every storage trait from `boostly-store` using the `heed` LMDB
//! bindings. Each table maps to one named database, plus secondary indexes,
//! inside a single environment. Records are `bincode`-encoded.

pub mod account;
pub mod endorsement;
pub mod environment;
pub mod error;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod notification;
pub mod store;
pub mod student;
pub mod transfer;
pub mod voucher;
pub mod write_batch;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::IntegrityReport;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use store::LmdbStore;
pub use write_batch::LmdbBatch;
