//! LMDB implementation of AccountStore.
//!
//! Key format: `student(16) ++ period(3)`. Periods encode big-endian, so a
//! reverse scan over one student's prefix meets the latest period first.

use heed::RoTxn;

use boostly_store::{AccountStore, LedgerAccount, StoreError};
use boostly_types::{PeriodKey, StudentId};

use crate::environment::LmdbEnvironment;
use crate::keys::{account_key, decode, scan_prefix};
use crate::{LmdbError, LmdbStore};

/// The student's account for the latest period on record.
pub(crate) fn latest_account_in(
    env: &LmdbEnvironment,
    txn: &RoTxn,
    student: &StudentId,
) -> Result<Option<LedgerAccount>, LmdbError> {
    Ok(scan_prefix(
        &env.student_credits_db,
        txn,
        student.as_bytes(),
        true,
        1,
        |_, val| decode(val),
    )?
    .pop())
}

pub(crate) fn get_account_in(
    env: &LmdbEnvironment,
    txn: &RoTxn,
    student: &StudentId,
    period: &PeriodKey,
) -> Result<Option<LedgerAccount>, LmdbError> {
    env.student_credits_db
        .get(txn, &account_key(student, period))?
        .map(decode)
        .transpose()
}

impl AccountStore for LmdbStore {
    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(get_account_in(&self.env, &rtxn, student, period)?)
    }

    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(latest_account_in(&self.env, &rtxn, student)?)
    }

    fn account_history(&self, student: &StudentId) -> Result<Vec<LedgerAccount>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(scan_prefix(
            &self.env.student_credits_db,
            &rtxn,
            student.as_bytes(),
            false,
            usize::MAX,
            |_, val| decode(val),
        )?)
    }
}
