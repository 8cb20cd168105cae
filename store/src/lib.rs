//! Abstract storage traits for the Boostly ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The ledger engine depends only on the traits.
//!
//! Each table of the relational layout has its own read trait. All mutations
//! of balances, transfers, endorsements and voucher purchases go through a
//! [`LedgerBatch`], which commits atomically. Notifications are written
//! outside of batches so that a failure to record one never rolls back the
//! operation that produced it.

pub mod account;
pub mod batch;
pub mod endorsement;
pub mod error;
pub mod meta;
pub mod notification;
pub mod student;
pub mod transfer;
pub mod voucher;

pub use account::{AccountStore, LedgerAccount};
pub use batch::{BatchStore, LedgerBatch};
pub use endorsement::{Endorsement, EndorsementStore};
pub use error::StoreError;
pub use meta::MetaStore;
pub use notification::{Notification, NotificationKind, NotificationStore};
pub use student::{Student, StudentStore};
pub use transfer::{Transfer, TransferStore};
pub use voucher::{VoucherPurchase, VoucherStore};

/// Everything the ledger engine needs from a backend.
pub trait LedgerStore:
    BatchStore
    + StudentStore
    + AccountStore
    + TransferStore
    + EndorsementStore
    + VoucherStore
    + NotificationStore
    + Send
    + Sync
{
}

impl<T> LedgerStore for T where
    T: BatchStore
        + StudentStore
        + AccountStore
        + TransferStore
        + EndorsementStore
        + VoucherStore
        + NotificationStore
        + Send
        + Sync
{
}
