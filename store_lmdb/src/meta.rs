//! LMDB implementation of MetaStore.

use boostly_store::{MetaStore, StoreError};

use crate::migration::{read_version, write_version};
use crate::{LmdbError, LmdbStore};

impl MetaStore for LmdbStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.env
            .meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let val = self
            .env
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(read_version(&self.env, &rtxn)?)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        write_version(&self.env, &mut wtxn, version)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
