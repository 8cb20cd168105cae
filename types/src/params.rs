//! Ledger parameters.
//!
//! Loaded from the `[ledger]` table of the configuration file; every field
//! falls back to the value the student dashboard has always used.

use serde::{Deserialize, Serialize};

use crate::Credits;

/// Tunable values the ledger engine consults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Credits a student may send per calendar month, for newly opened accounts.
    #[serde(default = "default_monthly_send_limit")]
    pub monthly_send_limit: Credits,

    /// Spendable balance an account opens with.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Credits,

    /// Currency value of one redeemed credit.
    #[serde(default = "default_voucher_rate")]
    pub voucher_rate: u64,

    /// Default page size for the notification feed.
    #[serde(default = "default_notification_limit")]
    pub notification_limit: usize,

    /// Default page size for voucher purchase history.
    #[serde(default = "default_voucher_history_limit")]
    pub voucher_history_limit: usize,
}

fn default_monthly_send_limit() -> Credits {
    Credits::new(100)
}

fn default_starting_balance() -> Credits {
    Credits::new(100)
}

fn default_voucher_rate() -> u64 {
    5
}

fn default_notification_limit() -> usize {
    50
}

fn default_voucher_history_limit() -> usize {
    10
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            monthly_send_limit: default_monthly_send_limit(),
            starting_balance: default_starting_balance(),
            voucher_rate: default_voucher_rate(),
            notification_limit: default_notification_limit(),
            voucher_history_limit: default_voucher_history_limit(),
        }
    }
}
