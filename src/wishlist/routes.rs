//! Wishlist route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{Identity, MaybeIdentity, Requester};
use crate::cart::models::Owner;
use crate::cart::requests::GuestQuery;
use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::AddToWishlistRequest;
use super::responses::WishlistEntryResponse;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/wishlist", post(add))
        .route("/api/wishlist/user/:user_id", get(list_for_user))
        .route("/api/wishlist/guest/:guest_id", get(list_for_guest))
        .route("/api/wishlist/:id", delete(remove))
}

async fn add(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    JsonBody(request): JsonBody<AddToWishlistRequest>,
) -> Result<(StatusCode, Json<WishlistEntryResponse>)> {
    if let Some(user_id) = request.user_id {
        let identity = identity.ok_or(AppError::Unauthenticated)?;
        if !identity.can_act_for(user_id) {
            return Err(AppError::forbidden("You can only add to your own wishlist"));
        }
    }

    let entry = services::add_entry(state.store.as_ref(), &state.cache, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_for_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WishlistEntryResponse>>> {
    if !identity.can_act_for(user_id) {
        return Err(AppError::forbidden("You can only view your own wishlist"));
    }
    let entries =
        services::list_for_owner(state.store.as_ref(), &state.cache, &Owner::User(user_id)).await?;
    Ok(Json(entries))
}

async fn list_for_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<String>,
) -> Result<Json<Vec<WishlistEntryResponse>>> {
    let owner = Owner::from_fields(None, Some(guest_id))?;
    let entries = services::list_for_owner(state.store.as_ref(), &state.cache, &owner).await?;
    Ok(Json(entries))
}

async fn remove(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<Uuid>,
    Query(query): Query<GuestQuery>,
) -> Result<StatusCode> {
    let requester = Requester::resolve(identity, query.guest_id)?;
    services::remove_entry(state.store.as_ref(), id, &requester).await?;
    Ok(StatusCode::NO_CONTENT)
}
