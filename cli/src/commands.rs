//! Operator commands over a ledger engine.
//!
//! Every command renders either human-readable text or pretty JSON and
//! returns it; `main` decides where it goes.

use std::fmt::Write as _;

use anyhow::{anyhow, Context};
use serde::Serialize;

use boostly_ledger::{LedgerAudit, LedgerEngine, NotificationWarning};
use boostly_store::{LedgerStore, Student};
use boostly_types::{Clock, NotificationId, PeriodKey, StudentId, Timestamp};
use boostly_utils::format_relative;

/// How command output is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

impl Output {
    fn render<T: Serialize>(
        self,
        value: &T,
        human: impl FnOnce(&T) -> String,
    ) -> anyhow::Result<String> {
        match self {
            Output::Json => Ok(serde_json::to_string_pretty(value)?),
            Output::Human => Ok(human(value)),
        }
    }
}

/// Runs commands against one engine, rendering times relative to `now`.
pub struct Commands<'a, S, C> {
    engine: &'a LedgerEngine<S, C>,
    output: Output,
    now: Timestamp,
}

impl<'a, S: LedgerStore, C: Clock> Commands<'a, S, C> {
    pub fn new(engine: &'a LedgerEngine<S, C>, output: Output, now: Timestamp) -> Self {
        Self {
            engine,
            output,
            now,
        }
    }

    fn resolve(&self, roll: &str) -> anyhow::Result<Student> {
        self.engine
            .student_by_roll(roll.trim())?
            .ok_or_else(|| anyhow!("no student with roll identifier '{roll}'"))
    }

    pub fn onboard(&self, name: &str, roll: &str, email: Option<&str>) -> anyhow::Result<String> {
        let student = self.engine.onboard_student(name, roll, email)?;
        let balance = self.engine.params().starting_balance;
        self.output.render(&student, |s| {
            format!(
                "Onboarded {} ({}) with {balance} credits",
                s.display_name, s.roll_identifier
            )
        })
    }

    pub fn rename(&self, roll: &str, name: &str) -> anyhow::Result<String> {
        let student = self.resolve(roll)?;
        let student = self.engine.rename_student(&student.id, name)?;
        self.output.render(&student, |s| {
            format!("{} is now {}", s.roll_identifier, s.display_name)
        })
    }

    pub fn students(&self) -> anyhow::Result<String> {
        let students = self.engine.students()?;
        self.output.render(&students, |list| {
            if list.is_empty() {
                return "No students registered".to_string();
            }
            let mut out = String::new();
            for s in list {
                let _ = writeln!(
                    out,
                    "{:<14} {:<24} {}",
                    s.roll_identifier,
                    s.display_name,
                    s.email.as_deref().unwrap_or("-")
                );
            }
            out.trim_end().to_string()
        })
    }

    pub fn stats(&self, roll: &str) -> anyhow::Result<String> {
        let student = self.resolve(roll)?;
        let stats = self.engine.student_stats(&student.id)?;
        self.output.render(&stats, |st| {
            format!(
                "{} ({})\n\
                 Total credits:        {}\n\
                 Received credits:     {}\n\
                 Sent this month:      {} of {}\n\
                 Remaining this month: {}\n\
                 Endorsements:         {}\n\
                 Transfers:            {} sent, {} received\n\
                 Limit resets in {} days",
                st.student.display_name,
                st.student.roll_identifier,
                st.total_credits,
                st.credits_received,
                st.credits_sent_this_month,
                st.monthly_send_limit,
                st.remaining_limit,
                st.endorsements_received,
                st.transfers_sent,
                st.transfers_received,
                st.days_until_reset,
            )
        })
    }

    pub fn send(
        &self,
        from: &str,
        to: &str,
        amount: i64,
        message: Option<&str>,
    ) -> anyhow::Result<String> {
        let sender = self.resolve(from)?;
        let receiver = self.resolve(to)?;
        let receipt = self
            .engine
            .send_credits(&sender.id, &receiver.id, amount, message)?;
        self.output.render(&receipt, |r| {
            let mut out = format!(
                "Sent {} credits to {} ({})\nBalance {}, {} of {} sent this month",
                r.transfer.amount,
                receiver.display_name,
                receiver.roll_identifier,
                r.sender.total_credits,
                r.sender.credits_sent_this_month,
                r.sender.monthly_send_limit,
            );
            push_warnings(&mut out, &r.warnings);
            out
        })
    }

    pub fn endorse(
        &self,
        from: &str,
        to: &str,
        recognition: Option<&str>,
    ) -> anyhow::Result<String> {
        let endorser = self.resolve(from)?;
        let endorsee = self.resolve(to)?;
        let receipt = self.engine.endorse(&endorser.id, &endorsee.id, recognition)?;
        self.output.render(&receipt, |r| {
            let mut out = format!(
                "{} endorsed {}",
                endorser.display_name, endorsee.display_name
            );
            push_warnings(&mut out, &r.warnings);
            out
        })
    }

    pub fn redeem(
        &self,
        roll: &str,
        vouchers: i64,
        credits_per_voucher: i64,
        rate: Option<u64>,
    ) -> anyhow::Result<String> {
        let student = self.resolve(roll)?;
        let rate = rate.unwrap_or(self.engine.params().voucher_rate);
        let receipt =
            self.engine
                .redeem_vouchers(&student.id, vouchers, credits_per_voucher, rate)?;
        self.output.render(&receipt, |r| {
            format!(
                "Redeemed {} credits for {} voucher(s) worth {}\n\
                 Balance {}, {} received credits left",
                r.purchase.total_credits_redeemed,
                r.purchase.num_vouchers,
                r.purchase.total_value,
                r.account.total_credits,
                r.account.credits_received,
            )
        })
    }

    pub fn history(&self, roll: &str, limit: Option<usize>) -> anyhow::Result<String> {
        #[derive(Serialize)]
        struct History {
            sent: Vec<boostly_store::Transfer>,
            received: Vec<boostly_store::Transfer>,
            vouchers: Vec<boostly_store::VoucherPurchase>,
        }

        let student = self.resolve(roll)?;
        let limit = limit.unwrap_or(self.engine.params().voucher_history_limit);
        let history = History {
            sent: self.engine.transfers_sent(&student.id)?,
            received: self.engine.transfers_received(&student.id)?,
            vouchers: self.engine.voucher_purchases(&student.id, limit)?,
        };
        let names = self.engine.students()?;
        let name_of = |id: StudentId| {
            names
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.display_name.as_str())
                .unwrap_or("unknown student")
        };

        self.output.render(&history, |h| {
            let mut out = String::new();
            let _ = writeln!(out, "Sent:");
            for t in &h.sent {
                let _ = writeln!(
                    out,
                    "  {:>4} to {:<24} {}",
                    t.amount.raw(),
                    name_of(t.receiver),
                    format_relative(t.created_at, self.now)
                );
            }
            let _ = writeln!(out, "Received:");
            for t in &h.received {
                let _ = writeln!(
                    out,
                    "  {:>4} from {:<22} {}",
                    t.amount.raw(),
                    name_of(t.sender),
                    format_relative(t.created_at, self.now)
                );
            }
            let _ = writeln!(out, "Vouchers:");
            for v in &h.vouchers {
                let _ = writeln!(
                    out,
                    "  {} x {} credits, value {}  {}",
                    v.num_vouchers,
                    v.credits_per_voucher,
                    v.total_value,
                    format_relative(v.created_at, self.now)
                );
            }
            out.trim_end().to_string()
        })
    }

    pub fn notifications(
        &self,
        roll: &str,
        limit: Option<usize>,
        unread_only: bool,
    ) -> anyhow::Result<String> {
        let student = self.resolve(roll)?;
        let limit = limit.unwrap_or(self.engine.params().notification_limit);
        let mut feed = self.engine.notifications(&student.id, limit)?;
        if unread_only {
            feed.retain(|n| !n.is_read);
        }
        self.output.render(&feed, |list| {
            if list.is_empty() {
                return "No notifications".to_string();
            }
            let mut out = String::new();
            for n in list {
                let marker = if n.is_read { ' ' } else { '*' };
                let _ = writeln!(
                    out,
                    "{marker} {}  {}  ({})\n    {}",
                    n.title,
                    format_relative(n.created_at, self.now),
                    n.id,
                    n.message
                );
                if let Some(details) = &n.details {
                    let _ = writeln!(out, "    \"{details}\"");
                }
            }
            out.trim_end().to_string()
        })
    }

    pub fn mark_read(&self, id: &str) -> anyhow::Result<String> {
        let id: NotificationId = id
            .parse()
            .with_context(|| format!("'{id}' is not a notification id"))?;
        if !self.engine.mark_notification_read(&id)? {
            return Err(anyhow!("notification {id} does not exist"));
        }
        self.output
            .render(&id, |id| format!("Marked notification {id} as read"))
    }

    pub fn set_limit(&self, roll: &str, limit: i64) -> anyhow::Result<String> {
        let student = self.resolve(roll)?;
        let account = self.engine.set_monthly_limit(&student.id, limit)?;
        self.output.render(&account, |a| {
            format!(
                "{} may send {} credits in {} ({} already sent)",
                student.display_name, a.monthly_send_limit, a.period, a.credits_sent_this_month
            )
        })
    }

    /// Open the current period for one student, or for every student when
    /// `roll` is `None`. An explicit `period` must name the current one.
    pub fn rollover(&self, roll: Option<&str>, period: Option<&str>) -> anyhow::Result<String> {
        let period = match period {
            Some(p) => p.parse::<PeriodKey>()?,
            None => self.engine.current_period()?,
        };
        let students = match roll {
            Some(roll) => vec![self.resolve(roll)?],
            None => self.engine.students()?,
        };
        let mut accounts = Vec::with_capacity(students.len());
        for student in &students {
            accounts.push(self.engine.rollover_period(&student.id, period)?);
        }
        self.output.render(&accounts, |list| {
            format!("Opened {period} for {} student(s)", list.len())
        })
    }

    /// The rendered report, and whether the ledger is clean.
    pub fn audit(&self) -> anyhow::Result<(String, bool)> {
        let audit = self.engine.audit()?;
        let clean = audit.is_clean();
        let text = self.output.render(&audit, render_audit)?;
        Ok((text, clean))
    }
}

fn push_warnings(out: &mut String, warnings: &[NotificationWarning]) {
    for w in warnings {
        let _ = write!(
            out,
            "\nwarning: {} notification not delivered: {}",
            w.kind, w.reason
        );
    }
}

fn render_audit(audit: &LedgerAudit) -> String {
    let mut out = format!(
        "Students:     {}\nCirculating:  {} credits\nTransfers:    {}",
        audit.students, audit.credits_in_circulation, audit.transfers
    );
    if audit.is_clean() {
        out.push_str("\nNo invariant violations");
    }
    for v in &audit.violations {
        let _ = write!(out, "\nviolation: {v}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use boostly_nullables::{NullClock, NullStore};
    use boostly_types::LedgerParams;

    const NOW: u64 = 1_742_040_000;

    fn engine() -> LedgerEngine<NullStore, NullClock> {
        let engine = LedgerEngine::with_clock(
            NullStore::new(),
            NullClock::new(NOW),
            LedgerParams::default(),
        );
        engine
            .onboard_student("Sarah Johnson", "2K22/EC/45", None)
            .unwrap();
        engine
            .onboard_student("Michael Chen", "2K22/EC/52", None)
            .unwrap();
        engine
    }

    fn human(engine: &LedgerEngine<NullStore, NullClock>) -> Commands<'_, NullStore, NullClock> {
        Commands::new(engine, Output::Human, Timestamp::new(NOW))
    }

    #[test]
    fn send_and_read_notifications() {
        let engine = engine();
        let cmd = human(&engine);

        let out = cmd
            .send("2K22/EC/45", "2K22/EC/52", 30, Some("Thanks!"))
            .unwrap();
        assert!(out.starts_with("Sent 30 credits to Michael Chen"));
        assert!(out.contains("Balance 70, 30 of 100 sent this month"));

        let feed = cmd.notifications("2K22/EC/52", None, false).unwrap();
        assert!(feed.contains("You received 30 credits"));
        assert!(feed.contains("Just now"));
        assert!(feed.contains("\"Thanks!\""));
    }

    #[test]
    fn unknown_roll_is_reported() {
        let engine = engine();
        let err = human(&engine).stats("2K22/EC/99").unwrap_err();
        assert!(err.to_string().contains("2K22/EC/99"));
    }

    #[test]
    fn ledger_rejections_surface_their_message() {
        let engine = engine();
        let err = human(&engine)
            .send("2K22/EC/45", "2K22/EC/52", 150, None)
            .unwrap_err();
        assert!(err.to_string().contains("monthly sending limit reached"));
    }

    #[test]
    fn json_stats() {
        let engine = engine();
        let cmd = Commands::new(&engine, Output::Json, Timestamp::new(NOW));
        let out = cmd.stats("2K22/EC/45").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total_credits"], 100);
        assert_eq!(value["days_until_reset"], 16);
    }

    #[test]
    fn mark_read_checks_the_id() {
        let engine = engine();
        let cmd = human(&engine);
        assert!(cmd.mark_read("not-an-id").is_err());
        assert!(cmd.mark_read(&NotificationId::new().to_string()).is_err());

        cmd.endorse("2K22/EC/45", "2K22/EC/52", None).unwrap();
        let michael = engine.student_by_roll("2K22/EC/52").unwrap().unwrap();
        let id = engine.notifications(&michael.id, 10).unwrap()[0].id;
        assert!(cmd.mark_read(&id.to_string()).unwrap().contains("as read"));
        assert_eq!(
            cmd.notifications("2K22/EC/52", None, true).unwrap(),
            "No notifications"
        );
    }

    #[test]
    fn rollover_every_student() {
        let engine = engine();
        let cmd = human(&engine);
        assert_eq!(cmd.rollover(None, None).unwrap(), "Opened 2025-03 for 2 student(s)");
        assert_eq!(
            cmd.rollover(Some("2K22/EC/45"), Some("2025-03")).unwrap(),
            "Opened 2025-03 for 1 student(s)"
        );
        assert!(cmd.rollover(None, Some("2025-13")).is_err());
    }

    #[test]
    fn rollover_refuses_other_periods() {
        let engine = engine();
        let cmd = human(&engine);
        for period in ["2025-04", "2025-02"] {
            let err = cmd.rollover(None, Some(period)).unwrap_err();
            assert!(err.to_string().contains("current period 2025-03"));
        }
        cmd.send("2K22/EC/45", "2K22/EC/52", 30, None).unwrap();
        let (text, clean) = cmd.audit().unwrap();
        assert!(clean);
        assert!(text.contains("Circulating:  200 credits"));
    }

    #[test]
    fn clean_audit() {
        let engine = engine();
        let (text, clean) = human(&engine).audit().unwrap();
        assert!(clean);
        assert!(text.contains("Circulating:  200 credits"));
    }
}
