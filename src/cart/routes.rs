//! Cart route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{Identity, MaybeIdentity, Requester};
use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::{AddToCartRequest, GuestQuery, MergeCartRequest, UpdateCartLineRequest};
use super::responses::{CartLineResponse, CartResponse};
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", post(add))
        .route("/api/cart/merge", post(merge))
        .route("/api/cart/user/:user_id", get(list_for_user))
        .route("/api/cart/guest/:guest_id", get(list_for_guest))
        .route("/api/cart/:id", patch(update).delete(remove))
}

async fn add(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLineResponse>)> {
    if let Some(user_id) = request.user_id {
        let identity = identity.ok_or(AppError::Unauthenticated)?;
        if !identity.can_act_for(user_id) {
            return Err(AppError::forbidden("You can only add to your own cart"));
        }
    }

    let line = services::add_line(state.store.as_ref(), &state.cache, request).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn list_for_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CartResponse>> {
    if !identity.can_act_for(user_id) {
        return Err(AppError::forbidden("You can only view your own cart"));
    }
    let cart = services::list_for_user(state.store.as_ref(), &state.cache, user_id).await?;
    Ok(Json(cart))
}

async fn list_for_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let cart = services::list_for_guest(state.store.as_ref(), &state.cache, &guest_id).await?;
    Ok(Json(cart))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateCartLineRequest>,
) -> Result<Json<CartLineResponse>> {
    let line = services::update_line(state.store.as_ref(), &state.cache, id, request).await?;
    Ok(Json(line))
}

async fn remove(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<Uuid>,
    Query(query): Query<GuestQuery>,
) -> Result<Json<Value>> {
    let requester = Requester::resolve(identity, query.guest_id)?;
    services::delete_line(state.store.as_ref(), id, &requester).await?;
    Ok(Json(json!({ "message": "Cart line deleted", "id": id })))
}

async fn merge(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(request): JsonBody<MergeCartRequest>,
) -> Result<Json<CartResponse>> {
    let cart = services::merge_guest_cart(
        state.store.as_ref(),
        &state.cache,
        &request.guest_id,
        identity.id,
    )
    .await?;
    Ok(Json(cart))
}
