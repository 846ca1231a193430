//! Notification service functions.
//!
//! Reads and state toggles are always scoped to the requesting recipient.

use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};

use super::models::{Notification, NotificationDraft, NotificationKind};
use super::requests::SendNotificationRequest;

pub async fn list(store: &dyn Store, recipient_id: Uuid) -> Result<Vec<Notification>> {
    store.list_notifications(recipient_id).await
}

pub async fn mark_read(store: &dyn Store, recipient_id: Uuid, id: Uuid) -> Result<Notification> {
    store
        .mark_notification_read(recipient_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification"))
}

pub async fn mark_all_read(store: &dyn Store, recipient_id: Uuid) -> Result<u64> {
    store.mark_all_notifications_read(recipient_id).await
}

pub async fn unread_count(store: &dyn Store, recipient_id: Uuid) -> Result<u64> {
    store.unread_notification_count(recipient_id).await
}

pub async fn delete(store: &dyn Store, recipient_id: Uuid, id: Uuid) -> Result<()> {
    if !store.delete_notification(recipient_id, id).await? {
        return Err(AppError::not_found("Notification"));
    }
    Ok(())
}

/// Admin send. Unlike side-channel notifications this is the primary
/// operation, so it writes directly and store errors are returned.
pub async fn send(store: &dyn Store, request: SendNotificationRequest) -> Result<Vec<Notification>> {
    let kind: NotificationKind = request
        .kind
        .as_deref()
        .unwrap_or("system")
        .parse()?;
    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::validation("title is required"))?;
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::validation("message is required"))?;

    let recipients = match (request.recipient_id, request.to_admins) {
        (Some(recipient), false) => vec![recipient],
        (None, true) => store.admin_ids().await?,
        _ => {
            return Err(AppError::validation(
                "Exactly one of recipientId or toAdmins is required",
            ))
        }
    };

    let mut draft = NotificationDraft::new(kind, title, message);
    draft.related_order_id = request.related_order_id;
    draft.related_user_id = request.related_user_id;
    if let Some(metadata) = request.metadata {
        draft = draft.metadata(metadata);
    }

    let mut sent = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let notification = draft.clone().into_notification(recipient);
        store.insert_notification(&notification).await?;
        sent.push(notification);
    }
    Ok(sent)
}
