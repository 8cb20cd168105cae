//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::{Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::keys::BytesDb;
use crate::LmdbError;

/// Room for every named database plus future additions.
const MAX_DBS: u32 = 16;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) students_db: BytesDb,
    pub(crate) student_rolls_db: BytesDb,
    pub(crate) student_credits_db: BytesDb,
    pub(crate) transfers_db: BytesDb,
    pub(crate) transfers_by_sender_db: BytesDb,
    pub(crate) transfers_by_receiver_db: BytesDb,
    pub(crate) endorsements_db: BytesDb,
    pub(crate) endorsements_by_endorsee_db: BytesDb,
    pub(crate) voucher_purchases_db: BytesDb,
    pub(crate) notifications_db: BytesDb,
    pub(crate) notification_index_db: BytesDb,
    pub(crate) meta_db: BytesDb,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path`, creating every database.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Environment(format!("{}: {e}", path.display())))?;

        // SAFETY: each data directory is opened once per process; the store
        // owns the only handle and callers never open the same path twice.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)
        }
        .map_err(|e| LmdbError::Environment(format!("{}: {e}", path.display())))?;

        let mut wtxn = env.write_txn()?;
        let environment = Self {
            students_db: env.create_database(&mut wtxn, Some("students"))?,
            student_rolls_db: env.create_database(&mut wtxn, Some("student_rolls"))?,
            student_credits_db: env.create_database(&mut wtxn, Some("student_credits"))?,
            transfers_db: env.create_database(&mut wtxn, Some("credit_transactions"))?,
            transfers_by_sender_db: env.create_database(&mut wtxn, Some("transfers_by_sender"))?,
            transfers_by_receiver_db: env
                .create_database(&mut wtxn, Some("transfers_by_receiver"))?,
            endorsements_db: env.create_database(&mut wtxn, Some("endorsements"))?,
            endorsements_by_endorsee_db: env
                .create_database(&mut wtxn, Some("endorsements_by_endorsee"))?,
            voucher_purchases_db: env.create_database(&mut wtxn, Some("voucher_purchases"))?,
            notifications_db: env.create_database(&mut wtxn, Some("notifications"))?,
            notification_index_db: env.create_database(&mut wtxn, Some("notification_index"))?,
            meta_db: env.create_database(&mut wtxn, Some("meta"))?,
            env: Arc::new(env.clone()),
        };
        wtxn.commit()?;
        Ok(environment)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub(crate) fn read_txn(&self) -> Result<RoTxn<'_>, LmdbError> {
        Ok(self.env.read_txn()?)
    }

    /// Begin a write transaction. Blocks while another writer is active.
    pub(crate) fn write_txn(&self) -> Result<RwTxn<'_>, LmdbError> {
        Ok(self.env.write_txn()?)
    }
}
