//! Boostly credit ledger.
//!
//! Students start each month with a spendable balance and a monthly sending
//! limit. They move credits to each other, endorse each other once per pair,
//! and redeem credits received from peers for vouchers. Balances live in one
//! account row per student per calendar month; the row for a new month is
//! opened lazily by the first operation that needs it.

pub mod audit;
pub mod endorse;
pub mod engine;
pub mod error;
pub mod notify;
pub mod posting;
pub mod query;
pub mod redeem;
pub mod rollover;
pub mod transfer;

pub use audit::{InvariantViolation, LedgerAudit};
pub use endorse::EndorseReceipt;
pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use notify::NotificationWarning;
pub use query::StudentStats;
pub use redeem::RedeemReceipt;
pub use transfer::SendReceipt;
