//! The LMDB-backed ledger store.

use std::path::Path;

use tracing::{info, warn};

use crate::environment::LmdbEnvironment;
use crate::integrity::{check_data_dir, check_integrity};
use crate::migration::Migrator;
use crate::LmdbError;

/// Implements every `boostly-store` trait over one LMDB environment.
///
/// LMDB admits a single write transaction at a time, so batches opened from
/// different threads are applied one after another.
pub struct LmdbStore {
    pub(crate) env: LmdbEnvironment,
}

impl LmdbStore {
    /// Open the store at `path`, migrating the schema and checking integrity.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path).map_err(LmdbError::Environment)?;
        let store = Self {
            env: LmdbEnvironment::open(path, map_size)?,
        };

        let found = Migrator::run(&store.env)?;

        let report = check_integrity(store.env.env())?;
        if !report.is_healthy() {
            warn!(errors = ?report.errors, "integrity check failed");
            return Err(LmdbError::Corruption(report.errors.join("; ")));
        }
        info!(
            path = %path.display(),
            databases = report.databases_checked,
            entries = report.total_entries,
            schema_found = found,
            "ledger store opened"
        );
        Ok(store)
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}
