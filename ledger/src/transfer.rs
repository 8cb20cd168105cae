//! Peer-to-peer credit transfers.

use boostly_store::{BatchStore, LedgerAccount, LedgerBatch, LedgerStore, Transfer};
use boostly_types::{Clock, Credits, PeriodKey, StudentId, TransferId};
use serde::Serialize;
use tracing::info;

use crate::engine::{observe, LedgerEngine};
use crate::notify::{self, NotificationWarning};
use crate::posting::{apply_transfer, positive};
use crate::rollover::ensure_account_in;
use crate::LedgerError;

/// Outcome of a committed transfer.
#[derive(Clone, Debug, Serialize)]
pub struct SendReceipt {
    pub transfer: Transfer,
    /// Sender's account after the transfer.
    pub sender: LedgerAccount,
    /// Receiver's account after the transfer.
    pub receiver: LedgerAccount,
    /// Notifications that could not be recorded. The transfer stands regardless.
    pub warnings: Vec<NotificationWarning>,
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    /// Move `amount` credits from `sender` to `receiver`.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// the amount must be positive, the sender and receiver must differ, the
    /// amount must fit in the sender's remaining monthly limit, and finally
    /// in the sender's balance. Both accounts are read and written in a
    /// single batch, so concurrent sends from one student are serialised
    /// and neither can pass its checks against a stale balance.
    pub fn send_credits(
        &self,
        sender: &StudentId,
        receiver: &StudentId,
        amount: i64,
        message: Option<&str>,
    ) -> Result<SendReceipt, LedgerError> {
        let result = self.send_inner(sender, receiver, amount, message);
        observe("send_credits", &result);
        result
    }

    fn send_inner(
        &self,
        sender: &StudentId,
        receiver: &StudentId,
        amount: i64,
        message: Option<&str>,
    ) -> Result<SendReceipt, LedgerError> {
        let amount = Credits::new(positive("amount", amount)?);
        if sender == receiver {
            return Err(LedgerError::SelfTransfer(*sender));
        }

        let now = self.now();
        let period = PeriodKey::containing(now)?;
        let params = self.params();

        let mut batch = self.store().begin()?;
        let from = ensure_account_in(&mut batch, sender, period, params, now)?;
        let to = ensure_account_in(&mut batch, receiver, period, params, now)?;
        let sender_record = batch
            .get_student(sender)?
            .ok_or(LedgerError::AccountNotFound(*sender))?;
        let receiver_record = batch
            .get_student(receiver)?
            .ok_or(LedgerError::AccountNotFound(*receiver))?;

        let (from, to) = apply_transfer(&from, &to, amount, now)?;
        let transfer = Transfer {
            id: TransferId::new(),
            sender: *sender,
            receiver: *receiver,
            amount,
            message: message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_owned),
            created_at: now,
        };
        batch.put_account(&from)?;
        batch.put_account(&to)?;
        batch.insert_transfer(&transfer)?;
        batch.commit()?;

        info!(
            transfer = %transfer.id,
            sender = %sender,
            receiver = %receiver,
            %amount,
            sender_balance = %from.total_credits,
            sent_this_month = %from.credits_sent_this_month,
            "credits sent"
        );

        let warnings = notify::deliver(
            self.store(),
            &[
                notify::credits_sent(&sender_record, &receiver_record, &transfer),
                notify::credits_received(&sender_record, &receiver_record, &transfer),
            ],
        );

        Ok(SendReceipt {
            transfer,
            sender: from,
            receiver: to,
            warnings,
        })
    }
}
