//! Binary key layouts and record codecs shared by every table.
//!
//! All composite keys are fixed-width and big-endian, so LMDB's byte order
//! is also the logical order:
//!
//! | database              | key                                   | value                  |
//! |-----------------------|---------------------------------------|------------------------|
//! | `students`            | `student(16)`                         | `Student`              |
//! | `student_rolls`       | roll identifier (UTF-8)               | `student(16)`          |
//! | `student_credits`     | `student(16) ++ period(3)`            | `LedgerAccount`        |
//! | `credit_transactions` | `transfer(16)`                        | `Transfer`             |
//! | `transfers_by_sender` | `sender(16) ++ ts(8) ++ seq(8)`       | `transfer(16)`         |
//! | `transfers_by_receiver` | `receiver(16) ++ ts(8) ++ seq(8)`   | `transfer(16)`         |
//! | `endorsements`        | `endorser(16) ++ endorsee(16)`        | `Endorsement`          |
//! | `endorsements_by_endorsee` | `endorsee(16) ++ endorser(16)`   | empty                  |
//! | `voucher_purchases`   | `student(16) ++ ts(8) ++ seq(8)`      | `VoucherPurchase`      |
//! | `notifications`       | `recipient(16) ++ ts(8) ++ seq(8)`    | `Notification`         |
//! | `notification_index`  | `notification(16)`                    | `notifications` key    |
//! | `meta`                | UTF-8 name                            | raw bytes              |
//!
//! `seq` is a store-wide counter kept in `meta`, so rows sharing a timestamp
//! keep their insertion order.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use boostly_types::{PeriodKey, StudentId, Timestamp};

use crate::LmdbError;

pub(crate) type BytesDb = Database<Bytes, Bytes>;

pub(crate) const ID_LEN: usize = 16;
pub(crate) const ACCOUNT_KEY_LEN: usize = ID_LEN + PeriodKey::ENCODED_LEN;
pub(crate) const TIMELINE_KEY_LEN: usize = ID_LEN + 8 + 8;
pub(crate) const PAIR_KEY_LEN: usize = ID_LEN * 2;

const SEQUENCE_KEY: &[u8] = b"sequence";

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn account_key(student: &StudentId, period: &PeriodKey) -> [u8; ACCOUNT_KEY_LEN] {
    let mut key = [0u8; ACCOUNT_KEY_LEN];
    key[..ID_LEN].copy_from_slice(student.as_bytes());
    key[ID_LEN..].copy_from_slice(&period.to_bytes());
    key
}

/// `owner ++ ts_be ++ seq_be`: per-owner rows in chronological order.
pub(crate) fn timeline_key(owner: &StudentId, at: Timestamp, seq: u64) -> [u8; TIMELINE_KEY_LEN] {
    let mut key = [0u8; TIMELINE_KEY_LEN];
    key[..ID_LEN].copy_from_slice(owner.as_bytes());
    key[ID_LEN..ID_LEN + 8].copy_from_slice(&at.to_be_bytes());
    key[ID_LEN + 8..].copy_from_slice(&seq.to_be_bytes());
    key
}

pub(crate) fn pair_key(first: &StudentId, second: &StudentId) -> [u8; PAIR_KEY_LEN] {
    let mut key = [0u8; PAIR_KEY_LEN];
    key[..ID_LEN].copy_from_slice(first.as_bytes());
    key[ID_LEN..].copy_from_slice(second.as_bytes());
    key
}

/// Parse a 16-byte id stored as a value or key suffix.
pub(crate) fn id_bytes(bytes: &[u8]) -> Result<[u8; ID_LEN], LmdbError> {
    bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("expected {ID_LEN}-byte id, got {}", bytes.len())))
}

/// Turn `prefix` into the smallest key greater than every key it prefixes.
/// Returns `false` if no such key exists (the prefix is all `0xFF`).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.last_mut() {
        if *last == u8::MAX {
            prefix.pop();
        } else {
            *last += 1;
            return true;
        }
    }
    false
}

/// Decode up to `limit` rows whose key starts with `prefix`, either in key
/// order or, with `reverse`, newest first.
pub(crate) fn scan_prefix<T, F>(
    db: &BytesDb,
    txn: &RoTxn,
    prefix: &[u8],
    reverse: bool,
    limit: usize,
    mut row: F,
) -> Result<Vec<T>, LmdbError>
where
    F: FnMut(&[u8], &[u8]) -> Result<T, LmdbError>,
{
    let mut upper = prefix.to_vec();
    let end = if increment_prefix(&mut upper) {
        Bound::Excluded(upper.as_slice())
    } else {
        Bound::Unbounded
    };
    let bounds = (Bound::Included(prefix), end);

    let mut out = Vec::new();
    if reverse {
        for item in db.rev_range(txn, &bounds)? {
            if out.len() >= limit {
                break;
            }
            let (key, val) = item?;
            out.push(row(key, val)?);
        }
    } else {
        for item in db.range(txn, &bounds)? {
            if out.len() >= limit {
                break;
            }
            let (key, val) = item?;
            out.push(row(key, val)?);
        }
    }
    Ok(out)
}

/// Count rows whose key starts with `prefix`.
pub(crate) fn count_prefix(db: &BytesDb, txn: &RoTxn, prefix: &[u8]) -> Result<u64, LmdbError> {
    let rows = scan_prefix(db, txn, prefix, false, usize::MAX, |_, _| Ok(()))?;
    Ok(rows.len() as u64)
}

/// Draw the next value of the store-wide insertion counter.
pub(crate) fn next_sequence(meta_db: &BytesDb, txn: &mut RwTxn) -> Result<u64, LmdbError> {
    let current = match meta_db.get(txn, SEQUENCE_KEY)? {
        Some(bytes) => u64::from_be_bytes(
            bytes
                .try_into()
                .map_err(|_| LmdbError::Corruption("sequence has unexpected byte length".into()))?,
        ),
        None => 0,
    };
    let next = current + 1;
    meta_db.put(txn, SEQUENCE_KEY, &next.to_be_bytes())?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_prefix_carries() {
        let mut p = vec![0x01, 0xFF, 0xFF];
        assert!(increment_prefix(&mut p));
        assert_eq!(p, vec![0x02]);

        let mut p = vec![0xFF, 0xFF];
        assert!(!increment_prefix(&mut p));
        assert!(p.is_empty());
    }

    #[test]
    fn account_keys_sort_by_student_then_period() {
        let s = StudentId::from_bytes([7; 16]);
        let dec = account_key(&s, &PeriodKey::new(2024, 12).unwrap());
        let jan = account_key(&s, &PeriodKey::new(2025, 1).unwrap());
        assert!(dec < jan);
        assert_eq!(&jan[..ID_LEN], s.as_bytes());
    }

    #[test]
    fn timeline_keys_sort_by_time_then_sequence() {
        let s = StudentId::from_bytes([1; 16]);
        let a = timeline_key(&s, Timestamp::new(10), 9);
        let b = timeline_key(&s, Timestamp::new(11), 1);
        let c = timeline_key(&s, Timestamp::new(11), 2);
        assert!(a < b && b < c);
    }

    #[test]
    fn id_bytes_rejects_wrong_width() {
        assert!(id_bytes(&[0u8; 15]).is_err());
        assert_eq!(id_bytes(&[3u8; 16]).unwrap(), [3u8; 16]);
    }
}
