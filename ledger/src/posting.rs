//! Pure balance rules.
//!
//! Validation and state transitions for transfers and redemptions, free of
//! storage so they can be checked exhaustively. The engine runs these inside
//! a batch against freshly read accounts.

use boostly_store::LedgerAccount;
use boostly_types::{Credits, Timestamp};

use crate::LedgerError;

/// Accept a caller-supplied quantity if it is strictly positive.
pub fn positive(field: &'static str, value: i64) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(LedgerError::InvalidAmount { field, value })
}

/// Check a send against the sender's account: monthly limit first, then balance.
pub fn check_send(sender: &LedgerAccount, amount: Credits) -> Result<(), LedgerError> {
    let remaining = sender.remaining_limit();
    if amount > remaining {
        return Err(LedgerError::MonthlyLimitExceeded {
            limit: sender.monthly_send_limit,
            sent: sender.credits_sent_this_month,
            remaining,
            requested: amount,
        });
    }
    if amount > sender.total_credits {
        return Err(LedgerError::InsufficientBalance {
            requested: amount,
            available: sender.total_credits,
        });
    }
    Ok(())
}

/// Move `amount` from `sender` to `receiver`. Returns both updated accounts.
///
/// The receiver's `credits_received` grows with its balance. The sender's
/// `credits_received` is untouched unless the new balance falls below it, in
/// which case it is clamped to the balance so that `credits_received ≤
/// total_credits` keeps holding.
pub fn apply_transfer(
    sender: &LedgerAccount,
    receiver: &LedgerAccount,
    amount: Credits,
    now: Timestamp,
) -> Result<(LedgerAccount, LedgerAccount), LedgerError> {
    check_send(sender, amount)?;

    let mut s = sender.clone();
    s.total_credits = s
        .total_credits
        .checked_sub(amount)
        .ok_or(LedgerError::Overflow("sender balance"))?;
    s.credits_sent_this_month = s
        .credits_sent_this_month
        .checked_add(amount)
        .ok_or(LedgerError::Overflow("credits sent this month"))?;
    if s.credits_received > s.total_credits {
        s.credits_received = s.total_credits;
    }
    s.updated_at = now;

    let mut r = receiver.clone();
    r.total_credits = r
        .total_credits
        .checked_add(amount)
        .ok_or(LedgerError::Overflow("receiver balance"))?;
    r.credits_received = r
        .credits_received
        .checked_add(amount)
        .ok_or(LedgerError::Overflow("receiver credits received"))?;
    r.updated_at = now;

    Ok((s, r))
}

/// Check a redemption of `total` credits: received credits first, then balance.
pub fn check_redemption(account: &LedgerAccount, total: Credits) -> Result<(), LedgerError> {
    if total > account.credits_received {
        return Err(LedgerError::InsufficientReceivedCredits {
            requested: total,
            available: account.credits_received,
        });
    }
    if total > account.total_credits {
        return Err(LedgerError::InsufficientBalance {
            requested: total,
            available: account.total_credits,
        });
    }
    Ok(())
}

/// Remove `total` from both the balance and the received credits.
pub fn apply_redemption(
    account: &LedgerAccount,
    total: Credits,
    now: Timestamp,
) -> Result<LedgerAccount, LedgerError> {
    check_redemption(account, total)?;
    let mut a = account.clone();
    a.total_credits = a
        .total_credits
        .checked_sub(total)
        .ok_or(LedgerError::Overflow("balance after redemption"))?;
    a.credits_received = a
        .credits_received
        .checked_sub(total)
        .ok_or(LedgerError::Overflow("received credits after redemption"))?;
    a.updated_at = now;
    Ok(a)
}
