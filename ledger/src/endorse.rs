//! One-time peer endorsements.

use boostly_store::{BatchStore, Endorsement, LedgerBatch, LedgerStore, StoreError};
use boostly_types::{Clock, EndorsementId, StudentId};
use serde::Serialize;
use tracing::info;

use crate::engine::{observe, LedgerEngine};
use crate::notify::{self, NotificationWarning};
use crate::LedgerError;

#[derive(Clone, Debug, Serialize)]
pub struct EndorseReceipt {
    pub endorsement: Endorsement,
    pub warnings: Vec<NotificationWarning>,
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    /// Record that `endorser` endorses `endorsee`.
    ///
    /// Uniqueness of the pair is decided by the store inside the batch, so
    /// two racing calls for the same pair produce exactly one endorsement
    /// and one `AlreadyEndorsed`.
    pub fn endorse(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
        recognition_id: Option<&str>,
    ) -> Result<EndorseReceipt, LedgerError> {
        let result = self.endorse_inner(endorser, endorsee, recognition_id);
        observe("endorse", &result);
        result
    }

    fn endorse_inner(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
        recognition_id: Option<&str>,
    ) -> Result<EndorseReceipt, LedgerError> {
        if endorser == endorsee {
            return Err(LedgerError::SelfEndorsement(*endorser));
        }

        let mut batch = self.store().begin()?;
        let from = batch
            .get_student(endorser)?
            .ok_or(LedgerError::AccountNotFound(*endorser))?;
        let to = batch
            .get_student(endorsee)?
            .ok_or(LedgerError::AccountNotFound(*endorsee))?;

        let endorsement = Endorsement {
            id: EndorsementId::new(),
            endorser: *endorser,
            endorsee: *endorsee,
            recognition_id: recognition_id
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_owned),
            created_at: self.now(),
        };
        match batch.insert_endorsement(&endorsement) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(LedgerError::AlreadyEndorsed {
                    endorser: *endorser,
                    endorsee: *endorsee,
                })
            }
            Err(e) => return Err(e.into()),
        }
        batch.commit()?;

        info!(endorsement = %endorsement.id, endorser = %endorser, endorsee = %endorsee, "endorsed");

        let warnings = notify::deliver(
            self.store(),
            &[
                notify::endorsement_given(&from, &to, &endorsement),
                notify::endorsement_received(&from, &to, &endorsement),
            ],
        );
        Ok(EndorseReceipt {
            endorsement,
            warnings,
        })
    }
}
