//! Whole-ledger invariant audit.

use boostly_store::LedgerStore;
use boostly_types::{Clock, Credits, PeriodKey, StudentId};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::engine::LedgerEngine;
use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum InvariantViolation {
    /// `credits_received` exceeds `total_credits`.
    ReceivedExceedsBalance {
        student: StudentId,
        period: PeriodKey,
        received: Credits,
        total: Credits,
    },
    /// More was sent in the period than its limit allows.
    MonthlyLimitExceeded {
        student: StudentId,
        period: PeriodKey,
        sent: Credits,
        limit: Credits,
    },
    /// A student with no account row at all.
    MissingAccount { student: StudentId },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReceivedExceedsBalance {
                student,
                period,
                received,
                total,
            } => write!(
                f,
                "{student} in {period}: received {received} exceeds balance {total}"
            ),
            Self::MonthlyLimitExceeded {
                student,
                period,
                sent,
                limit,
            } => write!(f, "{student} in {period}: sent {sent} over limit {limit}"),
            Self::MissingAccount { student } => write!(f, "{student} has no ledger account"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerAudit {
    pub students: u64,
    /// Σ `total_credits` over every student's latest account.
    pub credits_in_circulation: Credits,
    pub transfers: u64,
    pub violations: Vec<InvariantViolation>,
}

impl LedgerAudit {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    /// Walk every student's latest account and check the balance invariants.
    pub fn audit(&self) -> Result<LedgerAudit, LedgerError> {
        let store = self.store();
        let mut report = LedgerAudit {
            transfers: store.transfer_count()?,
            ..LedgerAudit::default()
        };

        for student in store.iter_students()? {
            report.students += 1;
            let Some(account) = store.latest_account(&student.id)? else {
                report
                    .violations
                    .push(InvariantViolation::MissingAccount { student: student.id });
                continue;
            };

            report.credits_in_circulation = report
                .credits_in_circulation
                .checked_add(account.total_credits)
                .ok_or(LedgerError::Overflow("credits in circulation"))?;

            if account.credits_received > account.total_credits {
                report.violations.push(InvariantViolation::ReceivedExceedsBalance {
                    student: student.id,
                    period: account.period,
                    received: account.credits_received,
                    total: account.total_credits,
                });
            }
            if account.credits_sent_this_month > account.monthly_send_limit {
                report.violations.push(InvariantViolation::MonthlyLimitExceeded {
                    student: student.id,
                    period: account.period,
                    sent: account.credits_sent_this_month,
                    limit: account.monthly_send_limit,
                });
            }
        }

        if report.is_clean() {
            info!(
                students = report.students,
                circulation = %report.credits_in_circulation,
                "ledger audit clean"
            );
        } else {
            warn!(violations = report.violations.len(), "ledger audit found violations");
        }
        Ok(report)
    }
}
