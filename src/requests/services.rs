//! Support request service functions.
//!
//! New requests are announced to admins and admin updates are announced to
//! the requester, both through the best-effort [`Notifier`].

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::notifications::{NotificationDraft, NotificationKind, Notifier};

use super::models::{RequestStatus, SupportRequest};
use super::requests::{CreateSupportRequest, UpdateSupportRequest};

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn create_request(
    store: &dyn Store,
    notifier: &Notifier,
    requester_id: Uuid,
    request: CreateSupportRequest,
) -> Result<SupportRequest> {
    let subject = non_blank(request.subject)
        .ok_or_else(|| AppError::validation("subject is required"))?;
    let message = non_blank(request.message)
        .ok_or_else(|| AppError::validation("message is required"))?;

    let now = Utc::now();
    let ticket = SupportRequest {
        id: Uuid::new_v4(),
        requester_id,
        subject,
        message,
        contact_email: non_blank(request.contact_email),
        contact_phone: non_blank(request.contact_phone),
        status: RequestStatus::Pending,
        admin_response: None,
        responded_by: None,
        responded_at: None,
        created_at: now,
        updated_at: now,
    };

    store.insert_request(&ticket).await?;
    info!("Support request {} opened by {}", ticket.id, requester_id);

    notifier.broadcast_to_admins(
        NotificationDraft::new(
            NotificationKind::RequestCreated,
            "New support request",
            format!("New request: {}", ticket.subject),
        )
        .related_user(requester_id)
        .metadata(json!({ "requestId": ticket.id })),
    );

    Ok(ticket)
}

pub async fn list_mine(store: &dyn Store, requester_id: Uuid) -> Result<Vec<SupportRequest>> {
    store.list_requests(Some(requester_id), None).await
}

pub async fn list_all(store: &dyn Store, status: Option<RequestStatus>) -> Result<Vec<SupportRequest>> {
    store.list_requests(None, status).await
}

/// Requesters see their own requests; admins see all
pub async fn get_request(store: &dyn Store, identity: &Identity, id: Uuid) -> Result<SupportRequest> {
    let ticket = store
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("Request"))?;
    if !identity.can_act_for(ticket.requester_id) {
        return Err(AppError::forbidden("You can only view your own requests"));
    }
    Ok(ticket)
}

/// Admin update. Any status may follow any other; a response stamps who
/// answered and when.
pub async fn update_request(
    store: &dyn Store,
    notifier: &Notifier,
    admin: &Identity,
    id: Uuid,
    request: UpdateSupportRequest,
) -> Result<SupportRequest> {
    let response = non_blank(request.admin_response);
    if request.status.is_none() && response.is_none() {
        return Err(AppError::validation("status or adminResponse is required"));
    }

    let mut ticket = store
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("Request"))?;

    let now = Utc::now();
    if let Some(status) = request.status {
        ticket.status = status;
    }
    if let Some(response) = response {
        ticket.admin_response = Some(response);
        ticket.responded_by = Some(admin.id);
        ticket.responded_at = Some(now);
    }
    ticket.updated_at = now;

    if !store.update_request(&ticket).await? {
        return Err(AppError::not_found("Request"));
    }

    notifier.emit(
        ticket.requester_id,
        NotificationDraft::new(
            NotificationKind::RequestUpdated,
            "Your support request was updated",
            format!("\"{}\" is now {}", ticket.subject, ticket.status.as_str()),
        )
        .related_user(admin.id)
        .metadata(json!({ "requestId": ticket.id, "status": ticket.status })),
    );

    Ok(ticket)
}

pub async fn delete_request(store: &dyn Store, id: Uuid) -> Result<()> {
    if !store.delete_request(id).await? {
        return Err(AppError::not_found("Request"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::{MemoryStore, NotificationStore};
    use crate::notifications::dispatcher::deliver;

    fn new_request() -> CreateSupportRequest {
        CreateSupportRequest {
            subject: Some("Damaged parcel".into()),
            message: Some("The box arrived crushed".into()),
            contact_email: Some("buyer@example.com".into()),
            contact_phone: Some(" ".into()),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_notifies_both_sides() {
        let store = MemoryStore::new();
        let admin = Identity::admin(Uuid::new_v4());
        store.register_user(admin.id, Role::Admin);
        let (notifier, mut queue) = Notifier::channel(8);
        let requester = Uuid::new_v4();

        let ticket = create_request(&store, &notifier, requester, new_request())
            .await
            .unwrap();
        assert_eq!(ticket.status, RequestStatus::Pending);
        assert!(ticket.contact_phone.is_none());

        let updated = update_request(
            &store,
            &notifier,
            &admin,
            ticket.id,
            UpdateSupportRequest {
                status: Some(RequestStatus::Resolved),
                admin_response: Some("Refund issued".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, RequestStatus::Resolved);
        assert_eq!(updated.responded_by, Some(admin.id));
        assert!(updated.responded_at.is_some());

        drop(notifier);
        while let Some(dispatch) = queue.recv().await {
            deliver(&store, dispatch).await;
        }

        let admin_inbox = store.list_notifications(admin.id).await.unwrap();
        assert_eq!(admin_inbox.len(), 1);
        assert_eq!(admin_inbox[0].kind, NotificationKind::RequestCreated);

        let requester_inbox = store.list_notifications(requester).await.unwrap();
        assert_eq!(requester_inbox.len(), 1);
        assert_eq!(requester_inbox[0].kind, NotificationKind::RequestUpdated);
    }

    #[tokio::test]
    async fn test_visibility() {
        let store = MemoryStore::new();
        let (notifier, _queue) = Notifier::channel(8);
        let requester = Uuid::new_v4();
        let ticket = create_request(&store, &notifier, requester, new_request())
            .await
            .unwrap();

        assert!(get_request(&store, &Identity::user(requester), ticket.id).await.is_ok());
        assert!(get_request(&store, &Identity::admin(Uuid::new_v4()), ticket.id).await.is_ok());
        assert!(matches!(
            get_request(&store, &Identity::user(Uuid::new_v4()), ticket.id).await,
            Err(AppError::Forbidden(_))
        ));

        assert_eq!(list_mine(&store, requester).await.unwrap().len(), 1);
        assert!(list_mine(&store, Uuid::new_v4()).await.unwrap().is_empty());
        assert_eq!(list_all(&store, Some(RequestStatus::Pending)).await.unwrap().len(), 1);
        assert!(list_all(&store, Some(RequestStatus::Closed)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let store = MemoryStore::new();
        let (notifier, _queue) = Notifier::channel(8);
        let ticket = create_request(&store, &notifier, Uuid::new_v4(), new_request())
            .await
            .unwrap();

        let err = update_request(
            &store,
            &notifier,
            &Identity::admin(Uuid::new_v4()),
            ticket.id,
            UpdateSupportRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_subject() {
        let store = MemoryStore::new();
        let (notifier, _queue) = Notifier::channel(8);
        let mut request = new_request();
        request.subject = None;
        assert!(create_request(&store, &notifier, Uuid::new_v4(), request).await.is_err());
    }
}
