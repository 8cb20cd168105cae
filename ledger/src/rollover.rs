//! Lazy account creation and period rollover.
//!
//! Accounts are never created as a side effect of a read. Every mutating
//! operation calls [`ensure_account_in`] inside its batch, which returns the
//! student's row for the period, creating it if needed:
//!
//! - carried forward from the latest earlier period (balances kept, monthly
//!   counter reset), or
//! - opened with the configured starting balance for a student with no
//!   history at all.
//!
//! A period older than the student's latest row is closed, whether or not it
//! has a row of its own, and fails with [`LedgerError::PeriodClosed`].
//! Reopening one would hand out a second starting balance or move credits
//! on a superseded row.

use boostly_store::{LedgerAccount, LedgerBatch};
use boostly_types::{Credits, LedgerParams, PeriodKey, StudentId, Timestamp};
use tracing::debug;

use crate::LedgerError;

/// The first account a student ever has.
pub fn opening_account(
    student: StudentId,
    period: PeriodKey,
    params: &LedgerParams,
    now: Timestamp,
) -> LedgerAccount {
    LedgerAccount {
        student_id: student,
        period,
        total_credits: params.starting_balance,
        credits_received: Credits::ZERO,
        credits_sent_this_month: Credits::ZERO,
        monthly_send_limit: params.monthly_send_limit,
        updated_at: now,
    }
}

/// The account for `period` derived from an earlier period's account.
pub fn carry_forward(previous: &LedgerAccount, period: PeriodKey, now: Timestamp) -> LedgerAccount {
    LedgerAccount {
        student_id: previous.student_id,
        period,
        total_credits: previous.total_credits,
        credits_received: previous.credits_received,
        credits_sent_this_month: Credits::ZERO,
        monthly_send_limit: previous.monthly_send_limit,
        updated_at: now,
    }
}

/// Return the student's account for `period`, creating and staging it in
/// `batch` when absent. Idempotent within and across batches.
pub fn ensure_account_in<B: LedgerBatch>(
    batch: &mut B,
    student: &StudentId,
    period: PeriodKey,
    params: &LedgerParams,
    now: Timestamp,
) -> Result<LedgerAccount, LedgerError> {
    let account = match batch.latest_account(student)? {
        Some(latest) if latest.period == period => return Ok(latest),
        Some(latest) if latest.period > period => {
            return Err(LedgerError::PeriodClosed {
                student: *student,
                requested: period,
                latest: latest.period,
            });
        }
        Some(previous) => {
            debug!(
                student = %student,
                from = %previous.period,
                to = %period,
                total = %previous.total_credits,
                "rolling account over to new period"
            );
            carry_forward(&previous, period, now)
        }
        None if batch.get_student(student)?.is_none() => {
            return Err(LedgerError::AccountNotFound(*student));
        }
        None => {
            debug!(student = %student, period = %period, "opening ledger account");
            opening_account(*student, period, params, now)
        }
    };
    batch.put_account(&account)?;
    Ok(account)
}
