//! Support request route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{AdminIdentity, Identity};
use crate::error::Result;
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::{CreateSupportRequest, StatusFilter, UpdateSupportRequest};
use super::responses::SupportRequestResponse;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/requests", get(list_all).post(create))
        .route("/api/requests/mine", get(list_mine))
        .route(
            "/api/requests/:id",
            get(detail).patch(update).delete(remove),
        )
}

async fn create(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(request): JsonBody<CreateSupportRequest>,
) -> Result<(StatusCode, Json<SupportRequestResponse>)> {
    let ticket =
        services::create_request(state.store.as_ref(), &state.notifier, identity.id, request)
            .await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

async fn list_mine(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<SupportRequestResponse>>> {
    let tickets = services::list_mine(state.store.as_ref(), identity.id).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

async fn list_all(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<SupportRequestResponse>>> {
    let tickets = services::list_all(state.store.as_ref(), filter.status).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportRequestResponse>> {
    let ticket = services::get_request(state.store.as_ref(), &identity, id).await?;
    Ok(Json(ticket.into()))
}

async fn update(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateSupportRequest>,
) -> Result<Json<SupportRequestResponse>> {
    let ticket =
        services::update_request(state.store.as_ref(), &state.notifier, &admin, id, request)
            .await?;
    Ok(Json(ticket.into()))
}

async fn remove(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services::delete_request(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
