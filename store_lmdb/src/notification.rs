//! LMDB implementation of NotificationStore.
//!
//! Notifications are written in their own write transaction, never inside a
//! ledger batch. `notification_index` maps an id to its timeline key so that
//! `mark_read` does not need to scan.

use boostly_store::{Notification, NotificationStore, StoreError};
use boostly_types::{NotificationId, StudentId};

use crate::keys::{decode, encode, next_sequence, scan_prefix, timeline_key};
use crate::{LmdbError, LmdbStore};

impl NotificationStore for LmdbStore {
    fn put_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        let bytes = encode(notification)?;
        let mut wtxn = self.env.write_txn()?;
        let seq = next_sequence(&self.env.meta_db, &mut wtxn)?;
        let key = timeline_key(&notification.recipient, notification.created_at, seq);
        self.env
            .notifications_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .notification_index_db
            .put(&mut wtxn, notification.id.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let Some(key) = self
            .env
            .notification_index_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let notification = self
            .env
            .notifications_db
            .get(&rtxn, key)
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?;
        Ok(notification)
    }

    fn notifications_for(
        &self,
        recipient: &StudentId,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(scan_prefix(
            &self.env.notifications_db,
            &rtxn,
            recipient.as_bytes(),
            true,
            limit,
            |_, val| decode(val),
        )?)
    }

    fn mark_read(&self, id: &NotificationId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let Some(key) = self
            .env
            .notification_index_db
            .get(&wtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .map(<[u8]>::to_vec)
        else {
            return Ok(false);
        };
        let Some(mut notification) = self
            .env
            .notifications_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(decode::<Notification>)
            .transpose()?
        else {
            let msg = format!("index entry for missing notification {id}");
            return Err(LmdbError::Corruption(msg).into());
        };
        if !notification.is_read {
            notification.is_read = true;
            self.env
                .notifications_db
                .put(&mut wtxn, &key, &encode(&notification)?)
                .map_err(LmdbError::from)?;
            wtxn.commit().map_err(LmdbError::from)?;
        }
        Ok(true)
    }
}
