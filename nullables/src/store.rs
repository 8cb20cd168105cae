//! Nullable store: thread-safe in-memory storage for testing.
//!
//! All ledger tables live behind one mutex. A [`NullBatch`] holds that mutex
//! for its whole lifetime and works on a private copy of the tables, so
//! batches are serialised and a dropped batch leaves no trace. Notifications
//! live behind their own mutex and can be made to fail independently.

use boostly_store::{
    AccountStore, BatchStore, Endorsement, EndorsementStore, LedgerAccount, LedgerBatch,
    Notification, NotificationStore, StoreError, Student, StudentStore, Transfer, TransferStore,
    VoucherPurchase, VoucherStore,
};
use boostly_types::{NotificationId, PeriodKey, StudentId, TransferId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
struct Tables {
    students: HashMap<StudentId, Student>,
    rolls: HashMap<String, StudentId>,
    accounts: BTreeMap<(StudentId, PeriodKey), LedgerAccount>,
    transfers: Vec<Transfer>,
    endorsements: BTreeMap<(StudentId, StudentId), Endorsement>,
    purchases: Vec<VoucherPurchase>,
}

/// An in-memory ledger store for testing.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    notifications: Mutex<Vec<Notification>>,
    unavailable: AtomicBool,
    fail_notifications: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Newest first; equal timestamps in reverse insertion order.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> u64,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by_key(|item| std::cmp::Reverse(key(item)));
    out
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make notification writes fail while leaving the ledger tables healthy.
    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Insert or overwrite a student directly, bypassing the ledger.
    pub fn seed_student(&self, student: Student) {
        let mut tables = lock(&self.tables);
        tables
            .rolls
            .insert(student.roll_identifier.clone(), student.id);
        tables.students.insert(student.id, student);
    }

    /// Insert or overwrite an account row directly, bypassing the ledger.
    pub fn seed_account(&self, account: LedgerAccount) {
        lock(&self.tables)
            .accounts
            .insert((account.student_id, account.period), account);
    }

    /// Every notification ever stored, in insertion order.
    pub fn all_notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    /// Every account row, ordered by student then period.
    pub fn all_accounts(&self) -> Vec<LedgerAccount> {
        lock(&self.tables).accounts.values().cloned().collect()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("null store switched off".into()))
        } else {
            Ok(())
        }
    }
}

impl StudentStore for NullStore {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables).students.get(id).cloned())
    }

    fn get_student_by_roll(&self, roll_identifier: &str) -> Result<Option<Student>, StoreError> {
        self.check()?;
        let tables = lock(&self.tables);
        Ok(tables
            .rolls
            .get(roll_identifier)
            .and_then(|id| tables.students.get(id))
            .cloned())
    }

    fn iter_students(&self) -> Result<Vec<Student>, StoreError> {
        self.check()?;
        let mut students: Vec<Student> = lock(&self.tables).students.values().cloned().collect();
        students.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.roll_identifier.cmp(&b.roll_identifier))
        });
        Ok(students)
    }
}

impl AccountStore for NullStore {
    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables).accounts.get(&(*student, *period)).cloned())
    }

    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(self.account_history(student)?.pop())
    }

    fn account_history(&self, student: &StudentId) -> Result<Vec<LedgerAccount>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables)
            .accounts
            .iter()
            .filter(|((s, _), _)| s == student)
            .map(|(_, a)| a.clone())
            .collect())
    }
}

impl TransferStore for NullStore {
    fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables)
            .transfers
            .iter()
            .find(|t| &t.id == id)
            .cloned())
    }

    fn transfers_sent_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError> {
        self.check()?;
        let tables = lock(&self.tables);
        Ok(newest_first(
            tables.transfers.iter().filter(|t| &t.sender == student).cloned(),
            |t| t.created_at.as_secs(),
        ))
    }

    fn transfers_received_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError> {
        self.check()?;
        let tables = lock(&self.tables);
        Ok(newest_first(
            tables.transfers.iter().filter(|t| &t.receiver == student).cloned(),
            |t| t.created_at.as_secs(),
        ))
    }

    fn transfer_count(&self) -> Result<u64, StoreError> {
        self.check()?;
        Ok(lock(&self.tables).transfers.len() as u64)
    }
}

impl EndorsementStore for NullStore {
    fn get_endorsement(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
    ) -> Result<Option<Endorsement>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables)
            .endorsements
            .get(&(*endorser, *endorsee))
            .cloned())
    }

    fn endorsements_received_count(&self, endorsee: &StudentId) -> Result<u64, StoreError> {
        self.check()?;
        Ok(lock(&self.tables)
            .endorsements
            .keys()
            .filter(|(_, e)| e == endorsee)
            .count() as u64)
    }

    fn endorsements_given_by(&self, endorser: &StudentId) -> Result<Vec<Endorsement>, StoreError> {
        self.check()?;
        Ok(lock(&self.tables)
            .endorsements
            .values()
            .filter(|e| &e.endorser == endorser)
            .cloned()
            .collect())
    }
}

impl VoucherStore for NullStore {
    fn voucher_purchases(
        &self,
        student: &StudentId,
        limit: usize,
    ) -> Result<Vec<VoucherPurchase>, StoreError> {
        self.check()?;
        let tables = lock(&self.tables);
        let mut purchases = newest_first(
            tables
                .purchases
                .iter()
                .filter(|p| &p.student_id == student)
                .cloned(),
            |p| p.created_at.as_secs(),
        );
        purchases.truncate(limit);
        Ok(purchases)
    }
}

impl NotificationStore for NullStore {
    fn put_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("notification table rejected write".into()));
        }
        lock(&self.notifications).push(notification.clone());
        Ok(())
    }

    fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, StoreError> {
        self.check()?;
        Ok(lock(&self.notifications)
            .iter()
            .find(|n| &n.id == id)
            .cloned())
    }

    fn notifications_for(
        &self,
        recipient: &StudentId,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        self.check()?;
        let all = lock(&self.notifications);
        let mut out = newest_first(
            all.iter().filter(|n| &n.recipient == recipient).cloned(),
            |n| n.created_at.as_secs(),
        );
        out.truncate(limit);
        Ok(out)
    }

    fn mark_read(&self, id: &NotificationId) -> Result<bool, StoreError> {
        self.check()?;
        let mut all = lock(&self.notifications);
        match all.iter_mut().find(|n| &n.id == id) {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A batch over a [`NullStore`]. Holds the table lock until committed or dropped.
pub struct NullBatch<'a> {
    guard: MutexGuard<'a, Tables>,
    staged: Tables,
}

impl BatchStore for NullStore {
    type Batch<'a>
        = NullBatch<'a>
    where
        Self: 'a;

    fn begin(&self) -> Result<NullBatch<'_>, StoreError> {
        self.check()?;
        let guard = lock(&self.tables);
        let staged = guard.clone();
        Ok(NullBatch { guard, staged })
    }
}

impl LedgerBatch for NullBatch<'_> {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        Ok(self.staged.students.get(id).cloned())
    }

    fn insert_student(&mut self, student: &Student) -> Result<(), StoreError> {
        if self.staged.students.contains_key(&student.id) {
            return Err(StoreError::Duplicate(format!("student {}", student.id)));
        }
        if self.staged.rolls.contains_key(&student.roll_identifier) {
            return Err(StoreError::Duplicate(format!(
                "roll {}",
                student.roll_identifier
            )));
        }
        self.staged
            .rolls
            .insert(student.roll_identifier.clone(), student.id);
        self.staged.students.insert(student.id, student.clone());
        Ok(())
    }

    fn update_student(&mut self, student: &Student) -> Result<(), StoreError> {
        let existing = self
            .staged
            .students
            .get_mut(&student.id)
            .ok_or_else(|| StoreError::NotFound(format!("student {}", student.id)))?;
        if existing.roll_identifier != student.roll_identifier {
            return Err(StoreError::Corruption(format!(
                "roll identifier of {} cannot change",
                student.id
            )));
        }
        *existing = student.clone();
        Ok(())
    }

    fn get_account(
        &self,
        student: &StudentId,
        period: &PeriodKey,
    ) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(self.staged.accounts.get(&(*student, *period)).cloned())
    }

    fn latest_account(&self, student: &StudentId) -> Result<Option<LedgerAccount>, StoreError> {
        Ok(self
            .staged
            .accounts
            .iter()
            .filter(|((s, _), _)| s == student)
            .map(|(_, a)| a.clone())
            .last())
    }

    fn put_account(&mut self, account: &LedgerAccount) -> Result<(), StoreError> {
        self.staged
            .accounts
            .insert((account.student_id, account.period), account.clone());
        Ok(())
    }

    fn insert_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError> {
        self.staged.transfers.push(transfer.clone());
        Ok(())
    }

    fn insert_endorsement(&mut self, endorsement: &Endorsement) -> Result<(), StoreError> {
        let key = (endorsement.endorser, endorsement.endorsee);
        if self.staged.endorsements.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "endorsement {} -> {}",
                endorsement.endorser, endorsement.endorsee
            )));
        }
        self.staged.endorsements.insert(key, endorsement.clone());
        Ok(())
    }

    fn insert_voucher_purchase(&mut self, purchase: &VoucherPurchase) -> Result<(), StoreError> {
        self.staged.purchases.push(purchase.clone());
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
