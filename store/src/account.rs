//! Ledger account storage trait.

use crate::StoreError;
use boostly_types::{Credits, PeriodKey, StudentId, Timestamp};
use serde::{Deserialize, Serialize};

/// One student's balances for one calendar month (`student_credits` row).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub student_id: StudentId,
    pub period: PeriodKey,
    /// Spendable balance.
    pub total_credits: Credits,
    /// The part of `total_credits` that arrived through transfers in. Redeemable.
    pub credits_received: Credits,
    /// Sent during `period`; starts at zero for every period.
    pub credits_sent_this_month: Credits,
    pub monthly_send_limit: Credits,
    pub updated_at: Timestamp,
}

impl LedgerAccount {
    /// How much more may be sent this period.
    pub fn remaining_limit(&self) -> Credits {
        self.monthly_send_limit
            .saturating_sub(self.credits_sent_this_month)
    }
}

/// Read access to the `student_credits` table.
pub trait AccountStore {
    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError>;

    /// The account for the most recent period the student has a row for.
    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError>;

    /// Every period's account for `student`, oldest first.
    fn account_history(&self, student: &StudentId) -> Result<Vec<LedgerAccount>, StoreError>;
}
