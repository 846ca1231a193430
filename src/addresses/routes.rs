//! Address book route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::AddressRequest;
use super::responses::AddressResponse;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/addresses", get(list).post(create))
        .route(
            "/api/addresses/:id",
            get(detail).put(update).delete(remove),
        )
        .route("/api/addresses/:id/default", put(set_default))
}

async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<AddressResponse>>> {
    let addresses = services::list_addresses(state.store.as_ref(), identity.id).await?;
    Ok(Json(addresses.into_iter().map(AddressResponse::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(request): JsonBody<AddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>)> {
    let address = services::create_address(state.store.as_ref(), identity.id, request).await?;
    Ok((StatusCode::CREATED, Json(address.into())))
}

async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<AddressResponse>> {
    let address = services::get_address(state.store.as_ref(), identity.id, id).await?;
    Ok(Json(address.into()))
}

async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<AddressRequest>,
) -> Result<Json<AddressResponse>> {
    let address = services::update_address(state.store.as_ref(), identity.id, id, request).await?;
    Ok(Json(address.into()))
}

async fn set_default(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<AddressResponse>> {
    let address = services::set_default(state.store.as_ref(), identity.id, id).await?;
    Ok(Json(address.into()))
}

async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services::delete_address(state.store.as_ref(), identity.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
