//! Credit transaction storage trait.

use crate::StoreError;
use boostly_types::{Credits, StudentId, Timestamp, TransferId};
use serde::{Deserialize, Serialize};

/// One credit movement between two students. Never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub sender: StudentId,
    pub receiver: StudentId,
    pub amount: Credits,
    pub message: Option<String>,
    pub created_at: Timestamp,
}

/// Read access to the `credit_transactions` table.
pub trait TransferStore {
    fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>, StoreError>;

    /// Transfers sent by `student`, newest first.
    fn transfers_sent_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError>;

    /// Transfers received by `student`, newest first.
    fn transfers_received_by(&self, student: &StudentId) -> Result<Vec<Transfer>, StoreError>;

    fn transfer_count(&self) -> Result<u64, StoreError>;
}
