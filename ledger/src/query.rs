//! Read-only views of the ledger.
//!
//! Queries never create accounts. When a student has no row for the current
//! period yet, the view is what [`LedgerEngine::ensure_account`] would
//! produce, computed without writing it.

use boostly_store::{LedgerAccount, LedgerStore, Notification, Student, Transfer, VoucherPurchase};
use boostly_types::{Clock, Credits, NotificationId, StudentId};
use serde::Serialize;

use crate::engine::LedgerEngine;
use crate::rollover::{carry_forward, opening_account};
use crate::LedgerError;

/// Dashboard figures for one student.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StudentStats {
    pub student: Student,
    pub total_credits: Credits,
    pub credits_received: Credits,
    pub credits_sent_this_month: Credits,
    pub monthly_send_limit: Credits,
    pub remaining_limit: Credits,
    pub endorsements_received: u64,
    pub transfers_sent: u64,
    pub transfers_received: u64,
    pub days_until_reset: u64,
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    pub fn students(&self) -> Result<Vec<Student>, LedgerError> {
        Ok(self.store().iter_students()?)
    }

    pub fn student(&self, id: &StudentId) -> Result<Student, LedgerError> {
        self.store()
            .get_student(id)?
            .ok_or(LedgerError::AccountNotFound(*id))
    }

    pub fn student_by_roll(&self, roll_identifier: &str) -> Result<Option<Student>, LedgerError> {
        Ok(self.store().get_student_by_roll(roll_identifier.trim())?)
    }

    /// The student's account as of the current period.
    pub fn current_account(&self, id: &StudentId) -> Result<LedgerAccount, LedgerError> {
        let now = self.now();
        let period = self.current_period()?;
        let store = self.store();
        Ok(match store.latest_account(id)? {
            Some(latest) if latest.period == period => latest,
            Some(latest) if latest.period > period => {
                return Err(LedgerError::PeriodClosed {
                    student: *id,
                    requested: period,
                    latest: latest.period,
                });
            }
            Some(previous) => carry_forward(&previous, period, now),
            None if store.get_student(id)?.is_none() => {
                return Err(LedgerError::AccountNotFound(*id));
            }
            None => opening_account(*id, period, self.params(), now),
        })
    }

    pub fn student_stats(&self, id: &StudentId) -> Result<StudentStats, LedgerError> {
        let student = self.student(id)?;
        let account = self.current_account(id)?;
        let store = self.store();
        Ok(StudentStats {
            total_credits: account.total_credits,
            credits_received: account.credits_received,
            credits_sent_this_month: account.credits_sent_this_month,
            monthly_send_limit: account.monthly_send_limit,
            remaining_limit: account.remaining_limit(),
            endorsements_received: store.endorsements_received_count(id)?,
            transfers_sent: store.transfers_sent_by(id)?.len() as u64,
            transfers_received: store.transfers_received_by(id)?.len() as u64,
            days_until_reset: account.period.days_until_reset(self.now()),
            student,
        })
    }

    /// Newest first, at most `limit`.
    pub fn notifications(
        &self,
        id: &StudentId,
        limit: usize,
    ) -> Result<Vec<Notification>, LedgerError> {
        Ok(self.store().notifications_for(id, limit)?)
    }

    /// Returns `false` if the notification does not exist.
    pub fn mark_notification_read(&self, id: &NotificationId) -> Result<bool, LedgerError> {
        Ok(self.store().mark_read(id)?)
    }

    pub fn transfers_sent(&self, id: &StudentId) -> Result<Vec<Transfer>, LedgerError> {
        Ok(self.store().transfers_sent_by(id)?)
    }

    pub fn transfers_received(&self, id: &StudentId) -> Result<Vec<Transfer>, LedgerError> {
        Ok(self.store().transfers_received_by(id)?)
    }

    pub fn voucher_purchases(
        &self,
        id: &StudentId,
        limit: usize,
    ) -> Result<Vec<VoucherPurchase>, LedgerError> {
        Ok(self.store().voucher_purchases(id, limit)?)
    }

    pub fn has_endorsed(
        &self,
        endorser: &StudentId,
        endorsee: &StudentId,
    ) -> Result<bool, LedgerError> {
        Ok(self.store().get_endorsement(endorser, endorsee)?.is_some())
    }

    pub fn endorsements_received(&self, id: &StudentId) -> Result<u64, LedgerError> {
        Ok(self.store().endorsements_received_count(id)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::{engine, student_with};
    use crate::LedgerError;
    use boostly_types::{Credits, StudentId};

    #[test]
    fn stats_reflect_activity() {
        let (engine, _) = engine();
        let a = student_with(&engine, "A", 150, 0, 40);
        let b = student_with(&engine, "B", 100, 0, 0);
        engine.send_credits(&a, &b, 50, None).unwrap();
        engine.endorse(&a, &b, None).unwrap();

        let stats = engine.student_stats(&b).unwrap();
        assert_eq!(stats.total_credits, Credits::new(150));
        assert_eq!(stats.credits_received, Credits::new(50));
        assert_eq!(stats.endorsements_received, 1);
        assert_eq!(stats.transfers_received, 1);
        assert_eq!(stats.transfers_sent, 0);
        // 2025-03-15 12:00 to 2025-04-01 00:00
        assert_eq!(stats.days_until_reset, 16);

        let stats = engine.student_stats(&a).unwrap();
        assert_eq!(stats.remaining_limit, Credits::new(10));
        assert!(engine.has_endorsed(&a, &b).unwrap());
        assert!(!engine.has_endorsed(&b, &a).unwrap());
    }

    #[test]
    fn reads_in_a_new_month_do_not_create_accounts() {
        let (engine, clock) = engine();
        let a = student_with(&engine, "A", 150, 20, 70);
        clock.set(1_743_552_000);

        let view = engine.current_account(&a).unwrap();
        assert_eq!(view.period.to_string(), "2025-04");
        assert_eq!(view.credits_sent_this_month, Credits::ZERO);
        assert_eq!(view.total_credits, Credits::new(150));
        assert_eq!(engine.store().all_accounts().len(), 1);
    }

    #[test]
    fn notifications_newest_first_and_mark_read() {
        let (engine, clock) = engine();
        let a = student_with(&engine, "A", 100, 0, 0);
        let b = student_with(&engine, "B", 100, 0, 0);
        engine.send_credits(&a, &b, 5, None).unwrap();
        clock.advance(60);
        engine.send_credits(&a, &b, 7, None).unwrap();

        let inbox = engine.notifications(&b, 50).unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].title, "You received 7 credits");
        assert!(!inbox[0].is_read);

        assert!(engine.mark_notification_read(&inbox[0].id).unwrap());
        assert!(engine.notifications(&b, 1).unwrap()[0].is_read);
        assert_eq!(engine.notifications(&b, 1).unwrap().len(), 1);

        let sent = engine.transfers_sent(&a).unwrap();
        assert_eq!(sent[0].amount, Credits::new(7));
    }

    #[test]
    fn unknown_student_queries() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.student_stats(&StudentId::new()),
            Err(LedgerError::AccountNotFound(_))
        ));
        assert_eq!(engine.student_by_roll("missing").unwrap(), None);
    }
}
