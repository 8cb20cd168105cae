use proptest::prelude::*;
use std::sync::Arc;

use boostly_ledger::{LedgerEngine, LedgerError};
use boostly_nullables::{NullClock, NullStore};
use boostly_store::{AccountStore, EndorsementStore};
use boostly_types::{Credits, LedgerParams, StudentId};

/// 2025-03-15 12:00:00 UTC.
const MID_MARCH: u64 = 1_742_040_000;
const STUDENTS: usize = 4;

type Engine = LedgerEngine<NullStore, Arc<NullClock>>;

#[derive(Clone, Debug)]
enum Op {
    Send { from: usize, to: usize, amount: i64 },
    Redeem { who: usize, count: i64, per: i64 },
    Endorse { from: usize, to: usize },
    NextMonth,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..STUDENTS, 0..STUDENTS, -5i64..120)
            .prop_map(|(from, to, amount)| Op::Send { from, to, amount }),
        2 => (0..STUDENTS, -1i64..6, -1i64..30)
            .prop_map(|(who, count, per)| Op::Redeem { who, count, per }),
        2 => (0..STUDENTS, 0..STUDENTS).prop_map(|(from, to)| Op::Endorse { from, to }),
        1 => Just(Op::NextMonth),
    ]
}

fn setup() -> (Engine, Arc<NullClock>, Vec<StudentId>) {
    let clock = Arc::new(NullClock::new(MID_MARCH));
    let engine =
        LedgerEngine::with_clock(NullStore::new(), clock.clone(), LedgerParams::default());
    let ids = (0..STUDENTS)
        .map(|i| {
            engine
                .onboard_student(&format!("Student {i}"), &format!("2K22/EC/{i:02}"), None)
                .unwrap()
                .id
        })
        .collect();
    (engine, clock, ids)
}

fn balances(engine: &Engine, ids: &[StudentId]) -> Vec<Credits> {
    ids.iter()
        .map(|id| engine.current_account(id).unwrap().total_credits)
        .collect()
}

proptest! {
    /// Σ total_credits only ever drops by what was redeemed, and every
    /// account row stays internally consistent.
    #[test]
    fn random_operations_preserve_invariants(ops in prop::collection::vec(op(), 1..60)) {
        let (engine, clock, ids) = setup();
        let mut redeemed = 0u64;
        let initial: u64 = (STUDENTS as u64) * 100;

        for op in ops {
            let before = engine.store().all_accounts();
            let result = match op {
                Op::Send { from, to, amount } => engine
                    .send_credits(&ids[from], &ids[to], amount, None)
                    .map(|_| ()),
                Op::Redeem { who, count, per } => engine
                    .redeem_vouchers(&ids[who], count, per, 5)
                    .map(|r| redeemed += r.purchase.total_credits_redeemed.raw()),
                Op::Endorse { from, to } => engine.endorse(&ids[from], &ids[to], None).map(|_| ()),
                Op::NextMonth => {
                    clock.advance(31 * 86_400);
                    Ok(())
                }
            };

            if let Err(e) = result {
                prop_assert!(e.is_rejection(), "unexpected fault {e}");
                prop_assert_eq!(engine.store().all_accounts(), before, "rejection changed state");
            }

            let audit = engine.audit().unwrap();
            prop_assert!(audit.is_clean(), "{:?}", audit.violations);
            prop_assert_eq!(audit.credits_in_circulation.raw() + redeemed, initial);
            for account in engine.store().all_accounts() {
                prop_assert!(account.credits_received <= account.total_credits);
                prop_assert!(account.credits_sent_this_month <= account.monthly_send_limit);
            }
        }
    }

    /// A send either moves exactly `amount` or changes nothing.
    #[test]
    fn send_is_all_or_nothing(amount in -10i64..250, sent in 0u64..=100) {
        let (engine, _, ids) = setup();
        let period = engine.current_period().unwrap();
        let mut acct = engine.store().get_account(&ids[0], &period).unwrap().unwrap();
        acct.total_credits = Credits::new(150);
        acct.credits_sent_this_month = Credits::new(sent);
        engine.store().seed_account(acct);

        let before = balances(&engine, &ids);
        match engine.send_credits(&ids[0], &ids[1], amount, None) {
            Ok(receipt) => {
                let amount = amount as u64;
                prop_assert!(amount <= 100 - sent && amount <= 150);
                prop_assert_eq!(receipt.sender.total_credits.raw(), 150 - amount);
                prop_assert_eq!(receipt.receiver.total_credits.raw(), before[1].raw() + amount);
            }
            Err(LedgerError::InvalidAmount { .. }) => prop_assert!(amount <= 0),
            Err(LedgerError::MonthlyLimitExceeded { remaining, .. }) => {
                prop_assert_eq!(remaining.raw(), 100 - sent);
                prop_assert!(amount as u64 > remaining.raw());
                prop_assert_eq!(balances(&engine, &ids), before);
            }
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }

    /// Endorsing any pair repeatedly yields exactly one row.
    #[test]
    fn endorsement_is_idempotent(times in 1usize..5) {
        let (engine, _, ids) = setup();
        let mut accepted = 0;
        for _ in 0..times {
            match engine.endorse(&ids[0], &ids[1], None) {
                Ok(_) => accepted += 1,
                Err(LedgerError::AlreadyEndorsed { .. }) => {}
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }
        prop_assert_eq!(accepted, 1);
        prop_assert_eq!(engine.store().endorsements_received_count(&ids[1]).unwrap(), 1);
        prop_assert!(engine.store().latest_account(&ids[1]).unwrap().is_some());
    }
}
