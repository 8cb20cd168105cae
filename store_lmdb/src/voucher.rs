//! LMDB implementation of VoucherStore.

use boostly_store::{StoreError, VoucherPurchase, VoucherStore};
use boostly_types::StudentId;

use crate::keys::{decode, scan_prefix};
use crate::LmdbStore;

impl VoucherStore for LmdbStore {
    fn voucher_purchases(
        &self,
        student: &StudentId,
        limit: usize,
    ) -> Result<Vec<VoucherPurchase>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(scan_prefix(
            &self.env.voucher_purchases_db,
            &rtxn,
            student.as_bytes(),
            true,
            limit,
            |_, val| decode(val),
        )?)
    }
}
