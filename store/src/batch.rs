//! Atomic read-modify-write batches.
//!
//! A batch is the storage collaborator's transaction primitive. Reads made
//! through a batch observe the batch's own staged writes, and no other batch
//! can interleave a write between those reads and [`LedgerBatch::commit`].
//! Dropping a batch without committing discards every staged write.

use crate::{Endorsement, LedgerAccount, Student, StoreError, Transfer, VoucherPurchase};
use boostly_types::{PeriodKey, StudentId};

/// Operations available inside one atomic write.
pub trait LedgerBatch {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError>;

    /// Insert a new student. Fails with [`StoreError::Duplicate`] if the id or
    /// the roll identifier is already taken.
    fn insert_student(&mut self, student: &Student) -> Result<(), StoreError>;

    /// Overwrite an existing student record. The roll identifier must not change.
    fn update_student(&mut self, student: &Student) -> Result<(), StoreError>;

    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError>;

    /// The student's account for the latest period on record, staged rows
    /// included.
    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError>;

    fn put_account(&mut self, account: &LedgerAccount) -> Result<(), StoreError>;

    fn insert_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError>;

    /// Insert an endorsement. Fails with [`StoreError::Duplicate`] if one
    /// already exists for the same `(endorser, endorsee)` pair.
    fn insert_endorsement(&mut self, endorsement: &Endorsement) -> Result<(), StoreError>;

    fn insert_voucher_purchase(&mut self, purchase: &VoucherPurchase) -> Result<(), StoreError>;

    /// Make every staged write visible at once.
    fn commit(self) -> Result<(), StoreError>;
}

/// A backend that can open batches.
pub trait BatchStore {
    type Batch<'a>: LedgerBatch
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Batch<'_>, StoreError>;
}
