//! Notification storage trait.

use crate::StoreError;
use boostly_types::{Credits, EndorsementId, NotificationId, StudentId, Timestamp, TransferId};
use serde::{Deserialize, Serialize};

/// What a notification is about, with the payload each kind carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    CreditsSent {
        receiver: StudentId,
        amount: Credits,
        transfer: TransferId,
    },
    CreditsReceived {
        sender: StudentId,
        amount: Credits,
        transfer: TransferId,
    },
    EndorsementGiven {
        endorsee: StudentId,
        endorsement: EndorsementId,
    },
    EndorsementReceived {
        endorser: StudentId,
        endorsement: EndorsementId,
    },
}

impl NotificationKind {
    /// The `notification_type` tag used by the presentation layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditsSent { .. } => "credits_sent",
            Self::CreditsReceived { .. } => "credits_received",
            Self::EndorsementGiven { .. } => "endorsement_given",
            Self::EndorsementReceived { .. } => "endorsement_received",
        }
    }

    /// The other student involved.
    pub fn counterpart(&self) -> &StudentId {
        match self {
            Self::CreditsSent { receiver, .. } => receiver,
            Self::CreditsReceived { sender, .. } => sender,
            Self::EndorsementGiven { endorsee, .. } => endorsee,
            Self::EndorsementReceived { endorser, .. } => endorser,
        }
    }
}

/// A message addressed to one student.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: StudentId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: Timestamp,
    pub is_read: bool,
}

/// The `notifications` table.
///
/// Unlike the other tables this one is written directly rather than through
/// a batch.
pub trait NotificationStore {
    fn put_notification(&self, notification: &Notification) -> Result<(), StoreError>;

    fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, StoreError>;

    /// Up to `limit` notifications for `recipient`, newest first. Notifications
    /// sharing a timestamp come back in reverse insertion order.
    fn notifications_for(
        &self,
        recipient: &StudentId,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Set `is_read`. Returns `false` if no such notification exists.
    fn mark_read(&self, id: &NotificationId) -> Result<bool, StoreError>;
}
