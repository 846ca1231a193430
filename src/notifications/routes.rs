//! Notification route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{AdminIdentity, Identity};
use crate::error::Result;
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::SendNotificationRequest;
use super::responses::{
    MarkAllReadResponse, NotificationResponse, SendNotificationResponse, UnreadCountResponse,
};
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list).post(send))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", patch(mark_all_read))
        .route("/api/notifications/:id/read", patch(mark_read))
        .route("/api/notifications/:id", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<NotificationResponse>>> {
    let notifications = services::list(state.store.as_ref(), identity.id).await?;
    Ok(Json(
        notifications.into_iter().map(NotificationResponse::from).collect(),
    ))
}

async fn unread_count(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UnreadCountResponse>> {
    let count = services::unread_count(state.store.as_ref(), identity.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

async fn mark_read(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>> {
    let notification = services::mark_read(state.store.as_ref(), identity.id, id).await?;
    Ok(Json(notification.into()))
}

async fn mark_all_read(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<MarkAllReadResponse>> {
    let updated = services::mark_all_read(state.store.as_ref(), identity.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services::delete(state.store.as_ref(), identity.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn send(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    JsonBody(request): JsonBody<SendNotificationRequest>,
) -> Result<(StatusCode, Json<SendNotificationResponse>)> {
    let sent = services::send(state.store.as_ref(), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SendNotificationResponse {
            delivered: sent.len(),
            notifications: sent.into_iter().map(NotificationResponse::from).collect(),
        }),
    ))
}
