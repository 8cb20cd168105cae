//! Endorsement storage trait.

use crate::StoreError;
use boostly_types::{EndorsementId, StudentId, Timestamp};
use serde::{Deserialize, Serialize};

/// A one-time peer approval from `endorser` to `endorsee`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: EndorsementId,
    pub endorser: StudentId,
    pub endorsee: StudentId,
    pub recognition_id: Option<String>,
    pub created_at: Timestamp,
}

/// Read access to the `endorsements` table.
///
/// Backends keep at most one row per `(endorser, endorsee)`; see
/// [`LedgerBatch::insert_endorsement`](crate::LedgerBatch::insert_endorsement).
pub trait EndorsementStore {
    fn get_endorsement(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
    ) -> Result<Option<Endorsement>, StoreError>;

    fn endorsements_received_count(&self, endorsee: &StudentId) -> Result<u64, StoreError>;

    fn endorsements_given_by(&self, endorser: &StudentId) -> Result<Vec<Endorsement>, StoreError>;
}
