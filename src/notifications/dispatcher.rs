//! Fire-and-forget notification dispatch.
//!
//! Callers enqueue onto a bounded channel and carry on; a single worker task
//! drains it into the store. A full queue, a closed worker or a failing store
//! is logged and dropped, never reported to the caller.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::Store;

use super::models::{Notification, NotificationDraft, NotificationKind};

/// One unit of work for the notification worker
#[derive(Debug, Clone)]
pub enum Dispatch {
    One(Notification),
    /// Fanned out to every admin when delivered
    Admins(NotificationDraft),
}

/// Handle used by services to emit notifications
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::Sender<Dispatch>,
}

impl Notifier {
    /// Create a notifier and the receiving end for [`run_worker`]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Dispatch>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue a notification for one recipient.
    ///
    /// Returns the notification that will be stored, or `None` if it was dropped.
    pub fn emit(&self, recipient_id: Uuid, draft: NotificationDraft) -> Option<Notification> {
        let notification = draft.into_notification(recipient_id);
        self.enqueue(Dispatch::One(notification.clone()))
            .then_some(notification)
    }

    /// Queue a notification for every admin account
    pub fn broadcast_to_admins(&self, draft: NotificationDraft) -> bool {
        self.enqueue(Dispatch::Admins(draft))
    }

    fn enqueue(&self, dispatch: Dispatch) -> bool {
        match self.sender.try_send(dispatch) {
            Ok(()) => true,
            Err(TrySendError::Full(dispatch)) => {
                warn!("Notification queue full, dropping {:?}", kind_of(&dispatch));
                false
            }
            Err(TrySendError::Closed(dispatch)) => {
                warn!("Notification worker stopped, dropping {:?}", kind_of(&dispatch));
                false
            }
        }
    }
}

fn kind_of(dispatch: &Dispatch) -> NotificationKind {
    match dispatch {
        Dispatch::One(notification) => notification.kind,
        Dispatch::Admins(draft) => draft.kind,
    }
}

/// Store one dispatch; returns how many notifications were written
pub async fn deliver(store: &dyn Store, dispatch: Dispatch) -> usize {
    match dispatch {
        Dispatch::One(notification) => match store.insert_notification(&notification).await {
            Ok(()) => 1,
            Err(e) => {
                warn!(
                    "Failed to store notification for {}: {}",
                    notification.recipient_id, e
                );
                0
            }
        },
        Dispatch::Admins(draft) => {
            let admins = match store.admin_ids().await {
                Ok(admins) => admins,
                Err(e) => {
                    warn!("Failed to look up admins for notification: {}", e);
                    return 0;
                }
            };

            let mut delivered = 0;
            for admin_id in admins {
                let notification = draft.clone().into_notification(admin_id);
                match store.insert_notification(&notification).await {
                    Ok(()) => delivered += 1,
                    Err(e) => warn!("Failed to notify admin {}: {}", admin_id, e),
                }
            }
            delivered
        }
    }
}

/// Drain the queue until every [`Notifier`] has been dropped
pub async fn run_worker(store: Arc<dyn Store>, mut receiver: mpsc::Receiver<Dispatch>) {
    while let Some(dispatch) = receiver.recv().await {
        let delivered = deliver(store.as_ref(), dispatch).await;
        debug!("Delivered {} notification(s)", delivered);
    }
    debug!("Notification worker stopped");
}
