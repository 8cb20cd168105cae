//! Fundamental types for the Boostly credit ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, credit amounts, timestamps, calendar periods and ledger parameters.

pub mod amount;
pub mod error;
pub mod id;
pub mod params;
pub mod period;
pub mod time;

pub use amount::Credits;
pub use error::TypesError;
pub use id::{EndorsementId, NotificationId, PurchaseId, StudentId, TransferId};
pub use params::LedgerParams;
pub use period::PeriodKey;
pub use time::{Clock, SystemClock, Timestamp};
