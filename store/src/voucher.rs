//! Voucher purchase storage trait.

use crate::StoreError;
use boostly_types::{Credits, PurchaseId, StudentId, Timestamp};
use serde::{Deserialize, Serialize};

/// A redemption of received credits into vouchers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherPurchase {
    pub id: PurchaseId,
    pub student_id: StudentId,
    pub num_vouchers: u64,
    pub credits_per_voucher: Credits,
    /// `num_vouchers × credits_per_voucher`.
    pub total_credits_redeemed: Credits,
    pub voucher_rate: u64,
    /// `total_credits_redeemed × voucher_rate`.
    pub total_value: u64,
    pub created_at: Timestamp,
}

/// Read access to the `voucher_purchases` table.
pub trait VoucherStore {
    /// Up to `limit` purchases by `student`, newest first.
    fn voucher_purchases(
        &self,
        student: &StudentId,
        limit: usize,
    ) -> Result<Vec<VoucherPurchase>, StoreError>;
}
