//! LMDB implementation of EndorsementStore.
//!
//! `endorsements` is keyed by `endorser ++ endorsee`, which makes the pair
//! the primary key. `endorsements_by_endorsee` holds the reversed pair for
//! counting what a student has received.

use boostly_store::{Endorsement, EndorsementStore, StoreError};
use boostly_types::StudentId;

use crate::keys::{count_prefix, decode, pair_key, scan_prefix};
use crate::{LmdbError, LmdbStore};

impl EndorsementStore for LmdbStore {
    fn get_endorsement(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
    ) -> Result<Option<Endorsement>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let endorsement = self
            .env
            .endorsements_db
            .get(&rtxn, &pair_key(endorser, endorsee))
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?;
        Ok(endorsement)
    }

    fn endorsements_received_count(&self, endorsee: &StudentId) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(count_prefix(
            &self.env.endorsements_by_endorsee_db,
            &rtxn,
            endorsee.as_bytes(),
        )?)
    }

    fn endorsements_given_by(&self, endorser: &StudentId) -> Result<Vec<Endorsement>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(scan_prefix(
            &self.env.endorsements_db,
            &rtxn,
            endorser.as_bytes(),
            false,
            usize::MAX,
            |_, val| decode(val),
        )?)
    }
}
