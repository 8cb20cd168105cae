//! LMDB database integrity checks.
//!
//! Run on open to detect corruption before the ledger accepts writes.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that a valid Boostly environment contains.
pub const EXPECTED_DATABASES: &[&str] = &[
    "students",
    "student_rolls",
    "student_credits",
    "credit_transactions",
    "transfers_by_sender",
    "transfers_by_receiver",
    "endorsements",
    "endorsements_by_endorsee",
    "voucher_purchases",
    "notifications",
    "notification_index",
    "meta",
];

/// Count the entries of every expected database and cross-check the
/// secondary indexes against their primary tables.
///
/// Read failures are recorded in the report rather than returned.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };
    let mut counts = std::collections::HashMap::new();

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                        counts.insert(db_name, count);
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("failed to read database '{}': {}", db_name, e));
                    }
                }
            }
            Ok(None) => {
                report
                    .errors
                    .push(format!("database '{}' is missing", db_name));
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("failed to open database '{}': {}", db_name, e));
            }
        }
    }

    for (primary, index) in [
        ("students", "student_rolls"),
        ("credit_transactions", "transfers_by_sender"),
        ("credit_transactions", "transfers_by_receiver"),
        ("endorsements", "endorsements_by_endorsee"),
        ("notifications", "notification_index"),
    ] {
        if let (Some(p), Some(i)) = (counts.get(primary), counts.get(index)) {
            if p != i {
                report.errors.push(format!(
                    "index '{}' has {} entries but '{}' has {}",
                    index, i, primary, p
                ));
            }
        }
    }

    Ok(report)
}

/// Check that the data directory looks valid before opening.
///
/// A missing or empty directory is a fresh start. A non-empty directory
/// without `data.mdb` suggests the wrong path or a damaged environment.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let empty = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?
        .next()
        .is_none();
    if !empty && !path.join("data.mdb").exists() {
        return Err(format!(
            "directory {} is not empty but has no data.mdb",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("ledger")).is_ok());
        assert!(check_data_dir(dir.path()).is_ok());
    }

    #[test]
    fn foreign_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 5,
            total_entries: 100,
            errors: vec!["corruption detected".to_string()],
        };
        assert!(!report.is_healthy());
    }
}
