//! Voucher redemption of received credits.

use boostly_store::{BatchStore, LedgerAccount, LedgerBatch, LedgerStore, VoucherPurchase};
use boostly_types::{Clock, Credits, PeriodKey, PurchaseId, StudentId};
use serde::Serialize;
use tracing::info;

use crate::engine::{observe, LedgerEngine};
use crate::posting::{apply_redemption, positive};
use crate::rollover::ensure_account_in;
use crate::LedgerError;

#[derive(Clone, Debug, Serialize)]
pub struct RedeemReceipt {
    pub purchase: VoucherPurchase,
    /// The student's account after redemption.
    pub account: LedgerAccount,
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    /// Convert `num_vouchers × credits_per_voucher` received credits into
    /// vouchers worth `voucher_rate` currency units per credit.
    ///
    /// Only credits received from peers are redeemable; the starting balance
    /// is not.
    pub fn redeem_vouchers(
        &self,
        student: &StudentId,
        num_vouchers: i64,
        credits_per_voucher: i64,
        voucher_rate: u64,
    ) -> Result<RedeemReceipt, LedgerError> {
        let result = self.redeem_inner(student, num_vouchers, credits_per_voucher, voucher_rate);
        observe("redeem_vouchers", &result);
        result
    }

    fn redeem_inner(
        &self,
        student: &StudentId,
        num_vouchers: i64,
        credits_per_voucher: i64,
        voucher_rate: u64,
    ) -> Result<RedeemReceipt, LedgerError> {
        let per = positive("credits_per_voucher", credits_per_voucher)?;
        let count = positive("num_vouchers", num_vouchers)?;
        let total = count
            .checked_mul(per)
            .map(Credits::new)
            .ok_or(LedgerError::Overflow("credits redeemed"))?;

        let now = self.now();
        let period = PeriodKey::containing(now)?;
        let mut batch = self.store().begin()?;
        let account = ensure_account_in(&mut batch, student, period, self.params(), now)?;
        let account = apply_redemption(&account, total, now)?;
        let total_value = total
            .raw()
            .checked_mul(voucher_rate)
            .ok_or(LedgerError::Overflow("voucher value"))?;

        let purchase = VoucherPurchase {
            id: PurchaseId::new(),
            student_id: *student,
            num_vouchers: count,
            credits_per_voucher: Credits::new(per),
            total_credits_redeemed: total,
            voucher_rate,
            total_value,
            created_at: now,
        };
        batch.put_account(&account)?;
        batch.insert_voucher_purchase(&purchase)?;
        batch.commit()?;

        info!(
            purchase = %purchase.id,
            student = %student,
            vouchers = count,
            credits = %total,
            value = total_value,
            "vouchers redeemed"
        );
        Ok(RedeemReceipt { purchase, account })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::{engine, student_with};
    use crate::LedgerError;
    use boostly_store::{AccountStore, VoucherStore};
    use boostly_types::Credits;

    #[test]
    fn redeeming_received_credits() {
        let (engine, _) = engine();
        let id = student_with(&engine, "A", 150, 85, 0);

        let receipt = engine.redeem_vouchers(&id, 2, 10, 5).unwrap();
        assert_eq!(receipt.account.credits_received, Credits::new(65));
        assert_eq!(receipt.account.total_credits, Credits::new(130));
        assert_eq!(receipt.purchase.total_credits_redeemed, Credits::new(20));
        assert_eq!(receipt.purchase.total_value, 100);

        let history = engine.store().voucher_purchases(&id, 10).unwrap();
        assert_eq!(history, vec![receipt.purchase]);
    }

    #[test]
    fn cannot_redeem_more_than_received() {
        let (engine, _) = engine();
        let id = student_with(&engine, "A", 150, 85, 0);
        let before = engine.store().latest_account(&id).unwrap();

        assert!(matches!(
            engine.redeem_vouchers(&id, 10, 10, 5),
            Err(LedgerError::InsufficientReceivedCredits { requested, available })
                if requested == Credits::new(100) && available == Credits::new(85)
        ));
        assert_eq!(engine.store().latest_account(&id).unwrap(), before);
        assert!(engine.store().voucher_purchases(&id, 10).unwrap().is_empty());
    }

    #[test]
    fn credits_per_voucher_validated_first() {
        let (engine, _) = engine();
        let id = student_with(&engine, "A", 150, 85, 0);
        assert!(matches!(
            engine.redeem_vouchers(&id, 0, 0, 5),
            Err(LedgerError::InvalidAmount { field: "credits_per_voucher", .. })
        ));
        assert!(matches!(
            engine.redeem_vouchers(&id, -1, 10, 5),
            Err(LedgerError::InvalidAmount { field: "num_vouchers", value: -1 })
        ));
    }

    #[test]
    fn starting_balance_is_not_redeemable() {
        let (engine, _) = engine();
        let s = engine.onboard_student("Fresh", "R9", None).unwrap();
        assert!(matches!(
            engine.redeem_vouchers(&s.id, 1, 1, 5),
            Err(LedgerError::InsufficientReceivedCredits { .. })
        ));
    }

    #[test]
    fn overflowing_request_is_an_error_not_a_panic() {
        let (engine, _) = engine();
        let id = student_with(&engine, "A", 150, 85, 0);
        assert!(matches!(
            engine.redeem_vouchers(&id, i64::MAX, i64::MAX, 5),
            Err(LedgerError::Overflow(_))
        ));
    }
}
