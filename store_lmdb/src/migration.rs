//! Schema versioning.
//!
//! The version lives in the `meta` database under `schema_version` as a
//! little-endian `u32`; a fresh environment reads as version 0. Opening a
//! store applies every pending step and the version bump inside one write
//! transaction, so a crash mid-migration leaves the old schema intact.

use heed::{RoTxn, RwTxn};
use tracing::{debug, info};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

type Step = fn(&LmdbEnvironment, &mut RwTxn) -> Result<(), LmdbError>;

/// Migration steps, indexed by the version they upgrade from.
const STEPS: &[Step] = &[initial_schema];

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = STEPS.len() as u32;

/// Every database is created when the environment opens, so the first
/// version has nothing to move.
fn initial_schema(_env: &LmdbEnvironment, _txn: &mut RwTxn) -> Result<(), LmdbError> {
    Ok(())
}

pub(crate) fn read_version(env: &LmdbEnvironment, txn: &RoTxn) -> Result<u32, LmdbError> {
    match env.meta_db.get(txn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization(format!(
                    "schema_version is {} bytes, expected 4",
                    bytes.len()
                ))
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

pub(crate) fn write_version(
    env: &LmdbEnvironment,
    txn: &mut RwTxn,
    version: u32,
) -> Result<(), LmdbError> {
    env.meta_db
        .put(txn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
    Ok(())
}

pub struct Migrator;

impl Migrator {
    /// Bring the environment up to [`CURRENT_SCHEMA_VERSION`] and return the
    /// version it was found at. A version newer than this build understands
    /// is refused without touching the data.
    pub fn run(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
        let mut wtxn = env.write_txn()?;
        let stored = read_version(env, &wtxn)?;

        if stored > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Environment(format!(
                "schema version {stored} was written by a newer build (supported: {CURRENT_SCHEMA_VERSION})"
            )));
        }
        if stored == CURRENT_SCHEMA_VERSION {
            debug!(version = stored, "schema up to date");
            return Ok(stored);
        }

        for (from, step) in STEPS.iter().enumerate().skip(stored as usize) {
            info!(from, to = from + 1, "applying schema migration");
            step(env, &mut wtxn)?;
        }
        write_version(env, &mut wtxn, CURRENT_SCHEMA_VERSION)?;
        wtxn.commit()?;

        info!(from = stored, to = CURRENT_SCHEMA_VERSION, "schema migrated");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DEFAULT_MAP_SIZE;

    fn env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        (dir, env)
    }

    fn version(env: &LmdbEnvironment) -> u32 {
        read_version(env, &env.read_txn().unwrap()).unwrap()
    }

    #[test]
    fn fresh_environment_is_stamped() {
        let (_dir, env) = env();
        assert_eq!(version(&env), 0);
        assert_eq!(Migrator::run(&env).unwrap(), 0);
        assert_eq!(version(&env), CURRENT_SCHEMA_VERSION);
        assert_eq!(Migrator::run(&env).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_version_is_left_alone() {
        let (_dir, env) = env();
        let mut wtxn = env.write_txn().unwrap();
        write_version(&env, &mut wtxn, CURRENT_SCHEMA_VERSION + 3).unwrap();
        wtxn.commit().unwrap();

        assert!(matches!(
            Migrator::run(&env),
            Err(LmdbError::Environment(_))
        ));
        assert_eq!(version(&env), CURRENT_SCHEMA_VERSION + 3);
    }

    #[test]
    fn malformed_version_is_reported() {
        let (_dir, env) = env();
        let mut wtxn = env.write_txn().unwrap();
        env.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, b"v1")
            .unwrap();
        wtxn.commit().unwrap();
        assert!(matches!(
            Migrator::run(&env),
            Err(LmdbError::Serialization(_))
        ));
    }
}
