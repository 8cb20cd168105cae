//! LMDB implementation of TransferStore.
//!
//! Transfers live in `credit_transactions` keyed by id. Two timeline indexes
//! map `sender`/`receiver ++ ts ++ seq` back to the id.

use heed::RoTxn;

use boostly_store::{StoreError, Transfer, TransferStore};
use boostly_types::{StudentId, TransferId};

use crate::keys::{decode, id_bytes, scan_prefix, BytesDb};
use crate::{LmdbError, LmdbStore};

impl LmdbStore {
    fn transfers_via(
        &self,
        index: &BytesDb,
        student: &StudentId,
    ) -> Result<Vec<Transfer>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let ids = scan_prefix(index, &rtxn, student.as_bytes(), true, usize::MAX, |_, val| {
            id_bytes(val)
        })?;
        let mut transfers = Vec::with_capacity(ids.len());
        for id in ids {
            let transfer = self.load_transfer(&rtxn, &id)?.ok_or_else(|| {
                LmdbError::Corruption(format!(
                    "index entry for missing transfer {}",
                    TransferId::from_bytes(id)
                ))
            })?;
            transfers.push(transfer);
        }
        Ok(transfers)
    }

    fn load_transfer(&self, txn: &RoTxn, id: &[u8]) -> Result<Option<Transfer>, LmdbError> {
        self.env.transfers_db.get(txn, id)?.map(decode).transpose()
    }
}

impl TransferStore for LmdbStore {
    fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.load_transfer(&rtxn, id.as_bytes())?)
    }

    fn transfers_sent_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError> {
        self.transfers_via(&self.env.transfers_by_sender_db, student)
    }

    fn transfers_received_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError> {
        self.transfers_via(&self.env.transfers_by_receiver_db, student)
    }

    fn transfer_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.env.transfers_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
