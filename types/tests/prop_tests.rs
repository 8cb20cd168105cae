use proptest::prelude::*;

use boostly_types::{Credits, PeriodKey, StudentId, Timestamp};

proptest! {
    /// PeriodKey ordering agrees with the ordering of the timestamps it contains.
    #[test]
    fn period_order_follows_time(a in 0u64..4_000_000_000, b in 0u64..4_000_000_000) {
        let pa = PeriodKey::containing(Timestamp::new(a)).unwrap();
        let pb = PeriodKey::containing(Timestamp::new(b)).unwrap();
        if a <= b {
            prop_assert!(pa <= pb);
        } else {
            prop_assert!(pa >= pb);
        }
    }

    /// Every timestamp lies inside [start, next.start) of its period.
    #[test]
    fn timestamp_inside_its_period(secs in 0u64..4_000_000_000) {
        let ts = Timestamp::new(secs);
        let p = PeriodKey::containing(ts).unwrap();
        prop_assert!(p.start() <= ts);
        prop_assert!(ts < p.next().start());
    }

    /// The string form parses back to the same period.
    #[test]
    fn period_display_parses(year in 1970u16..9999, month in 1u8..=12) {
        let p = PeriodKey::new(year, month).unwrap();
        let parsed: PeriodKey = p.to_string().parse().unwrap();
        prop_assert_eq!(parsed, p);
    }

    /// Byte encoding preserves ordering, which the LMDB range scans depend on.
    #[test]
    fn period_bytes_preserve_order(
        y1 in 1970u16..3000, m1 in 1u8..=12,
        y2 in 1970u16..3000, m2 in 1u8..=12,
    ) {
        let a = PeriodKey::new(y1, m1).unwrap();
        let b = PeriodKey::new(y2, m2).unwrap();
        prop_assert_eq!(a.cmp(&b), a.to_bytes().cmp(&b.to_bytes()));
    }

    /// checked_sub never yields a value and a wrap: it is None exactly when b > a.
    #[test]
    fn credits_checked_sub(a in any::<u64>(), b in any::<u64>()) {
        let r = Credits::new(a).checked_sub(Credits::new(b));
        prop_assert_eq!(r.is_none(), b > a);
        if let Some(c) = r {
            prop_assert_eq!(c.raw() + b, a);
        }
    }

    /// Student ids survive bincode, the on-disk record encoding.
    #[test]
    fn student_id_bincode(bytes in prop::array::uniform16(0u8..)) {
        let id = StudentId::from_bytes(bytes);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: StudentId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }
}
