//! Write batching: one LMDB write transaction per ledger operation.
//!
//! ```ignore
//! let mut batch = store.begin()?;
//! let account = batch.get_account(&student, &period)?;
//! batch.put_account(&updated)?;
//! batch.insert_transfer(&transfer)?;
//! batch.commit()?;
//! ```
//!
//! Reads through the batch see its own writes. LMDB allows one writer at a
//! time, so a second batch blocks in [`BatchStore::begin`] until this one
//! commits or is dropped. Dropping without committing aborts the
//! transaction.

use heed::RwTxn;

use boostly_store::{
    BatchStore, Endorsement, LedgerAccount, LedgerBatch, Student, StoreError, Transfer,
    VoucherPurchase,
};
use boostly_types::{PeriodKey, StudentId};

use crate::account::{get_account_in, latest_account_in};
use crate::environment::LmdbEnvironment;
use crate::keys::{account_key, decode, encode, next_sequence, pair_key, timeline_key};
use crate::{LmdbError, LmdbStore};

pub struct LmdbBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> LmdbBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.write_txn()?;
        Ok(Self { txn, env })
    }
}

impl BatchStore for LmdbStore {
    type Batch<'a>
        = LmdbBatch<'a>
    where
        Self: 'a;

    fn begin(&self) -> Result<LmdbBatch<'_>, StoreError> {
        LmdbBatch::new(&self.env)
    }
}

impl LedgerBatch for LmdbBatch<'_> {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        let student = self
            .env
            .students_db
            .get(&self.txn, id.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?;
        Ok(student)
    }

    fn insert_student(&mut self, student: &Student) -> Result<(), StoreError> {
        let exists = self
            .env
            .students_db
            .get(&self.txn, student.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate(format!("student {}", student.id)));
        }
        let roll_taken = self
            .env
            .student_rolls_db
            .get(&self.txn, student.roll_identifier.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if roll_taken {
            return Err(StoreError::Duplicate(format!(
                "roll {}",
                student.roll_identifier
            )));
        }

        let bytes = encode(student)?;
        self.env
            .students_db
            .put(&mut self.txn, student.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .student_rolls_db
            .put(
                &mut self.txn,
                student.roll_identifier.as_bytes(),
                student.id.as_bytes(),
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_student(&mut self, student: &Student) -> Result<(), StoreError> {
        let existing = self
            .get_student(&student.id)?
            .ok_or_else(|| StoreError::NotFound(format!("student {}", student.id)))?;
        if existing.roll_identifier != student.roll_identifier {
            return Err(StoreError::Corruption(format!(
                "roll identifier of {} cannot change",
                student.id
            )));
        }
        let bytes = encode(student)?;
        self.env
            .students_db
            .put(&mut self.txn, student.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(get_account_in(self.env, &self.txn, student, period)?)
    }

    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(latest_account_in(self.env, &self.txn, student)?)
    }

    fn put_account(&mut self, account: &LedgerAccount) -> Result<(), StoreError> {
        let bytes = encode(account)?;
        let key = account_key(&account.student_id, &account.period);
        self.env
            .student_credits_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError> {
        let bytes = encode(transfer)?;
        let seq = next_sequence(&self.env.meta_db, &mut self.txn)?;
        let id = transfer.id.as_bytes();
        let by_sender = timeline_key(&transfer.sender, transfer.created_at, seq);
        let by_receiver = timeline_key(&transfer.receiver, transfer.created_at, seq);
        self.env
            .transfers_db
            .put(&mut self.txn, id, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .transfers_by_sender_db
            .put(&mut self.txn, &by_sender, id)
            .map_err(LmdbError::from)?;
        self.env
            .transfers_by_receiver_db
            .put(&mut self.txn, &by_receiver, id)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_endorsement(&mut self, endorsement: &Endorsement) -> Result<(), StoreError> {
        let key = pair_key(&endorsement.endorser, &endorsement.endorsee);
        let exists = self
            .env
            .endorsements_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate(format!(
                "endorsement {} -> {}",
                endorsement.endorser, endorsement.endorsee
            )));
        }
        let bytes = encode(endorsement)?;
        self.env
            .endorsements_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        let reversed = pair_key(&endorsement.endorsee, &endorsement.endorser);
        self.env
            .endorsements_by_endorsee_db
            .put(&mut self.txn, &reversed, &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_voucher_purchase(&mut self, purchase: &VoucherPurchase) -> Result<(), StoreError> {
        let bytes = encode(purchase)?;
        let seq = next_sequence(&self.env.meta_db, &mut self.txn)?;
        let key = timeline_key(&purchase.student_id, purchase.created_at, seq);
        self.env
            .voucher_purchases_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
