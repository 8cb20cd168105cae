use boostly_store::StoreError;
use boostly_types::{Credits, PeriodKey, StudentId, TypesError};
use thiserror::Error;

/// Why a ledger operation did not take effect.
///
/// Every rejection carries the numbers that caused it, so a caller can show
/// an actionable message without redoing the arithmetic.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{field} must be greater than 0, got {value}")]
    InvalidAmount { field: &'static str, value: i64 },

    #[error(
        "monthly sending limit reached: you can only send {remaining} more credits this month \
         ({limit} - {sent} = {remaining}), requested {requested}"
    )]
    MonthlyLimitExceeded {
        limit: Credits,
        sent: Credits,
        remaining: Credits,
        requested: Credits,
    },

    #[error("insufficient credits: requested {requested}, only {available} available")]
    InsufficientBalance {
        requested: Credits,
        available: Credits,
    },

    #[error(
        "insufficient received credits: tried to redeem {requested}, \
         only {available} received credits can be redeemed"
    )]
    InsufficientReceivedCredits {
        requested: Credits,
        available: Credits,
    },

    #[error("student {endorser} has already endorsed {endorsee}")]
    AlreadyEndorsed {
        endorser: StudentId,
        endorsee: StudentId,
    },

    #[error("student {0} cannot send credits to themselves")]
    SelfTransfer(StudentId),

    #[error("student {0} cannot endorse themselves")]
    SelfEndorsement(StudentId),

    #[error("roll identifier '{0}' is already registered")]
    RollTaken(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no ledger account can be opened for unknown student {0}")]
    AccountNotFound(StudentId),

    #[error(
        "period {requested} is closed: student {student} already has an account for {latest}"
    )]
    PeriodClosed {
        student: StudentId,
        requested: PeriodKey,
        latest: PeriodKey,
    },

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("calendar error: {0}")]
    Calendar(#[from] TypesError),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl LedgerError {
    /// Whether this is a business-rule rejection the caller can act on, as
    /// opposed to a storage or internal fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::StorageUnavailable(_)
                | Self::Storage(_)
                | Self::Overflow(_)
                | Self::Calendar(_)
                | Self::PeriodClosed { .. }
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            Self::StorageUnavailable(e.to_string())
        } else {
            Self::Storage(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_limit_message_shows_arithmetic() {
        let e = LedgerError::MonthlyLimitExceeded {
            limit: Credits::new(100),
            sent: Credits::new(55),
            remaining: Credits::new(45),
            requested: Credits::new(50),
        };
        let msg = e.to_string();
        assert!(msg.contains("100 - 55 = 45"), "{msg}");
        assert!(msg.contains("requested 50"), "{msg}");
    }

    #[test]
    fn unavailable_store_maps_to_storage_unavailable() {
        let e: LedgerError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(e, LedgerError::StorageUnavailable(_)));
        assert!(!e.is_rejection());

        let e: LedgerError = StoreError::Corruption("bad row".into()).into();
        assert!(matches!(e, LedgerError::Storage(_)));

        let e: LedgerError = StoreError::Backend("MDB_MAP_FULL".into()).into();
        assert!(matches!(e, LedgerError::Storage(StoreError::Backend(_))));
        assert!(!e.is_rejection());
    }

    #[test]
    fn validation_errors_are_rejections() {
        assert!(LedgerError::InvalidAmount {
            field: "amount",
            value: 0
        }
        .is_rejection());
        assert!(LedgerError::AccountNotFound(StudentId::new()).is_rejection());
    }
}
