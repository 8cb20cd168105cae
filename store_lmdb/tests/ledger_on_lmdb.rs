//! The ledger engine running on a real LMDB environment.

use std::sync::Arc;
use std::thread;

use boostly_ledger::{LedgerEngine, LedgerError};
use boostly_nullables::NullClock;
use boostly_store::{AccountStore, NotificationStore, TransferStore, VoucherStore};
use boostly_store_lmdb::{LmdbStore, DEFAULT_MAP_SIZE};
use boostly_types::{Credits, LedgerParams, StudentId};
use tempfile::TempDir;

/// 2025-03-15 12:00:00 UTC.
const MID_MARCH: u64 = 1_742_040_000;

type Engine = LedgerEngine<LmdbStore, Arc<NullClock>>;

fn engine() -> (TempDir, Engine, Arc<NullClock>) {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbStore::open(&dir.path().join("ledger"), DEFAULT_MAP_SIZE).unwrap();
    let clock = Arc::new(NullClock::new(MID_MARCH));
    let engine = LedgerEngine::with_clock(store, clock.clone(), LedgerParams::default());
    (dir, engine, clock)
}

fn onboard(engine: &Engine, name: &str, roll: &str) -> StudentId {
    engine.onboard_student(name, roll, None).unwrap().id
}

#[test]
fn send_then_redeem_received_credits() {
    let (_dir, engine, _) = engine();
    let a = onboard(&engine, "Sarah Johnson", "2K22/EC/45");
    let b = onboard(&engine, "Michael Chen", "2K22/EC/52");

    let receipt = engine
        .send_credits(&a, &b, 40, Some("Great presentation"))
        .unwrap();
    assert!(receipt.warnings.is_empty());
    assert_eq!(receipt.sender.total_credits, Credits::new(60));
    assert_eq!(receipt.receiver.credits_received, Credits::new(40));

    let err = engine.send_credits(&a, &b, 61, None).unwrap_err();
    assert!(matches!(err, LedgerError::MonthlyLimitExceeded { .. }));

    let redeemed = engine.redeem_vouchers(&b, 3, 10, 5).unwrap();
    assert_eq!(redeemed.account.total_credits, Credits::new(110));
    assert_eq!(redeemed.account.credits_received, Credits::new(10));
    assert_eq!(redeemed.purchase.total_value, 150);
    assert!(matches!(
        engine.redeem_vouchers(&b, 2, 10, 5),
        Err(LedgerError::InsufficientReceivedCredits { .. })
    ));

    let store = engine.store();
    assert_eq!(store.transfer_count().unwrap(), 1);
    assert_eq!(store.voucher_purchases(&b, 10).unwrap().len(), 1);
    assert_eq!(store.notifications_for(&a, 50).unwrap()[0].kind.as_str(), "credits_sent");
    assert_eq!(
        store.notifications_for(&b, 50).unwrap()[0].details.as_deref(),
        Some("Great presentation")
    );

    let audit = engine.audit().unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.credits_in_circulation, Credits::new(170));
}

#[test]
fn duplicate_roll_and_endorsement_are_rejected() {
    let (_dir, engine, _) = engine();
    let a = onboard(&engine, "Emily Davis", "2K22/EC/38");
    let b = onboard(&engine, "David Martinez", "2K22/EC/67");
    assert!(matches!(
        engine.onboard_student("Impostor", "2K22/EC/38", None),
        Err(LedgerError::RollTaken(_))
    ));

    engine.endorse(&a, &b, None).unwrap();
    assert!(matches!(
        engine.endorse(&a, &b, None),
        Err(LedgerError::AlreadyEndorsed { .. })
    ));
    assert_eq!(engine.endorsements_received(&b).unwrap(), 1);
}

#[test]
fn month_boundary_rolls_over() {
    let (_dir, engine, clock) = engine();
    let a = onboard(&engine, "A", "R1");
    let b = onboard(&engine, "B", "R2");
    engine.send_credits(&a, &b, 100, None).unwrap();

    // 2025-04-01 00:00 UTC
    clock.set(1_743_465_600);
    let receipt = engine.send_credits(&b, &a, 150, None);
    assert!(matches!(receipt, Err(LedgerError::MonthlyLimitExceeded { .. })));
    let receipt = engine.send_credits(&b, &a, 100, None).unwrap();
    assert_eq!(receipt.sender.period.to_string(), "2025-04");
    assert_eq!(receipt.sender.total_credits, Credits::new(100));
    assert_eq!(receipt.sender.credits_received, Credits::new(100));
    assert_eq!(engine.store().account_history(&b).unwrap().len(), 2);
}

#[test]
fn closed_period_is_not_reopened() {
    let (_dir, engine, clock) = engine();
    let a = onboard(&engine, "A", "R1");
    let b = onboard(&engine, "B", "R2");

    clock.set(1_743_465_600);
    engine.send_credits(&a, &b, 40, None).unwrap();
    assert!(matches!(
        engine.rollover_period(&a, "2025-03".parse().unwrap()),
        Err(LedgerError::InvalidInput(_))
    ));

    clock.set(1_742_040_000);
    assert!(matches!(
        engine.send_credits(&b, &a, 10, None),
        Err(LedgerError::PeriodClosed { .. })
    ));
    clock.set(1_743_465_600);
    let audit = engine.audit().unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.credits_in_circulation, Credits::new(200));
}

#[test]
fn concurrent_sends_serialise_on_the_write_lock() {
    let (_dir, engine, _) = engine();
    let engine = Arc::new(engine);
    let sender = onboard(&engine, "Sender", "S1");
    let receivers: Vec<_> = (0..6)
        .map(|i| onboard(&engine, &format!("Receiver {i}"), &format!("R{i}")))
        .collect();

    let handles: Vec<_> = receivers
        .into_iter()
        .map(|to| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.send_credits(&sender, &to, 25, None).is_ok())
        })
        .collect();
    let ok = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(ok, 4);
    let account = engine.current_account(&sender).unwrap();
    assert_eq!(account.total_credits, Credits::ZERO);
    assert_eq!(account.credits_sent_this_month, Credits::new(100));
    assert!(engine.audit().unwrap().is_clean());
}
