//! Roster files and seeding.
//!
//! A roster lists the students a deployment starts with:
//!
//! ```toml
//! [[students]]
//! name = "Sarah Johnson"
//! roll = "2K22/EC/45"
//! email = "sarah@example.com"
//! ```
//!
//! Seeding is repeatable. Missing students are onboarded with an opening
//! account, existing ones have their display name brought in line with the
//! file, and everything else is left alone.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use boostly_ledger::{LedgerEngine, LedgerError};
use boostly_store::LedgerStore;
use boostly_types::Clock;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub roll: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub students: Vec<RosterEntry>,
}

impl Roster {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Apply `roster` to the ledger. Stops at the first entry the ledger rejects.
pub fn seed<S: LedgerStore, C: Clock>(
    engine: &LedgerEngine<S, C>,
    roster: &Roster,
) -> Result<SeedReport, LedgerError> {
    let mut report = SeedReport::default();
    for entry in &roster.students {
        match engine.student_by_roll(entry.roll.trim())? {
            None => {
                engine.onboard_student(&entry.name, &entry.roll, entry.email.as_deref())?;
                report.created += 1;
            }
            Some(existing) if existing.display_name != entry.name.trim() => {
                engine.rename_student(&existing.id, &entry.name)?;
                report.updated += 1;
            }
            Some(_) => report.skipped += 1,
        }
    }
    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "roster seeded"
    );
    Ok(report)
}
