//! Notification fan-out.
//!
//! Notifications are derived from committed records and written after the
//! batch that produced them. A failed write is logged and reported back to
//! the caller as a [`NotificationWarning`]; it never undoes the mutation.

use boostly_store::{Endorsement, Notification, NotificationKind, NotificationStore, Student, Transfer};
use boostly_types::{NotificationId, StudentId, Timestamp};
use serde::Serialize;
use tracing::warn;

/// A notification that could not be recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationWarning {
    pub recipient: StudentId,
    pub kind: &'static str,
    pub reason: String,
}

fn build(
    recipient: StudentId,
    kind: NotificationKind,
    title: String,
    message: String,
    details: Option<String>,
    created_at: Timestamp,
) -> Notification {
    Notification {
        id: NotificationId::new(),
        recipient,
        kind,
        title,
        message,
        details,
        created_at,
        is_read: false,
    }
}

pub(crate) fn credits_sent(sender: &Student, receiver: &Student, transfer: &Transfer) -> Notification {
    build(
        sender.id,
        NotificationKind::CreditsSent {
            receiver: receiver.id,
            amount: transfer.amount,
            transfer: transfer.id,
        },
        format!("You sent {} credits", transfer.amount),
        format!(
            "You sent {} credits to {} ({})",
            transfer.amount, receiver.display_name, receiver.roll_identifier
        ),
        transfer.message.clone(),
        transfer.created_at,
    )
}

pub(crate) fn credits_received(
    sender: &Student,
    receiver: &Student,
    transfer: &Transfer,
) -> Notification {
    build(
        receiver.id,
        NotificationKind::CreditsReceived {
            sender: sender.id,
            amount: transfer.amount,
            transfer: transfer.id,
        },
        format!("You received {} credits", transfer.amount),
        format!(
            "You received {} credits from {} ({})",
            transfer.amount, sender.display_name, sender.roll_identifier
        ),
        transfer.message.clone(),
        transfer.created_at,
    )
}

fn recognition_details(endorsement: &Endorsement) -> Option<String> {
    endorsement
        .recognition_id
        .as_ref()
        .map(|r| format!("For recognition {r}"))
}

pub(crate) fn endorsement_given(
    endorser: &Student,
    endorsee: &Student,
    endorsement: &Endorsement,
) -> Notification {
    build(
        endorser.id,
        NotificationKind::EndorsementGiven {
            endorsee: endorsee.id,
            endorsement: endorsement.id,
        },
        format!("You endorsed {}", endorsee.display_name),
        format!(
            "You endorsed {} ({})",
            endorsee.display_name, endorsee.roll_identifier
        ),
        recognition_details(endorsement),
        endorsement.created_at,
    )
}

pub(crate) fn endorsement_received(
    endorser: &Student,
    endorsee: &Student,
    endorsement: &Endorsement,
) -> Notification {
    build(
        endorsee.id,
        NotificationKind::EndorsementReceived {
            endorser: endorser.id,
            endorsement: endorsement.id,
        },
        format!("{} endorsed you", endorser.display_name),
        format!(
            "{} ({}) endorsed you",
            endorser.display_name, endorser.roll_identifier
        ),
        recognition_details(endorsement),
        endorsement.created_at,
    )
}

/// Store each notification independently, collecting failures.
pub(crate) fn deliver<S: NotificationStore + ?Sized>(
    store: &S,
    notifications: &[Notification],
) -> Vec<NotificationWarning> {
    let mut warnings = Vec::new();
    for n in notifications {
        if let Err(e) = store.put_notification(n) {
            let kind = n.kind.as_str();
            warn!(
                recipient = %n.recipient,
                kind,
                error = %e,
                "notification not recorded, operation committed in degraded mode"
            );
            warnings.push(NotificationWarning {
                recipient: n.recipient,
                kind,
                reason: e.to_string(),
            });
        }
    }
    warnings
}
