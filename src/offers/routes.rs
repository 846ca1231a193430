//! Offer and coupon route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AdminIdentity;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::AppState;

use super::requests::{OfferRequest, ValidateCouponRequest};
use super::responses::{CouponSnapshot, OfferResponse, SweepReport};
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/coupons/validate", post(validate_coupon))
        .route("/api/offers", get(list).post(create))
        .route("/api/offers/active", get(active))
        .route("/api/offers/sweep", post(sweep))
        .route("/api/offers/:id", get(detail).put(update).delete(remove))
}

/// Public: check a coupon code
async fn validate_coupon(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ValidateCouponRequest>,
) -> Result<Json<CouponSnapshot>> {
    let snapshot = services::validate_coupon(state.store.as_ref(), &request.code, None).await?;
    Ok(Json(snapshot))
}

async fn active(State(state): State<AppState>) -> Result<Json<Vec<OfferResponse>>> {
    let offers = services::active_offers(state.store.as_ref(), &state.cache, None).await?;
    Ok(Json(offers.iter().map(OfferResponse::from).collect()))
}

async fn list(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Result<Json<Vec<OfferResponse>>> {
    let offers = services::list_offers(state.store.as_ref()).await?;
    Ok(Json(offers.iter().map(OfferResponse::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    JsonBody(request): JsonBody<OfferRequest>,
) -> Result<(StatusCode, Json<OfferResponse>)> {
    let offer = services::create_offer(state.store.as_ref(), &state.cache, request).await?;
    Ok((StatusCode::CREATED, Json(OfferResponse::from(&offer))))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>> {
    let offer = services::get_offer(state.store.as_ref(), id).await?;
    Ok(Json(OfferResponse::from(&offer)))
}

async fn update(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<OfferRequest>,
) -> Result<Json<OfferResponse>> {
    let offer = services::update_offer(state.store.as_ref(), &state.cache, id, request).await?;
    Ok(Json(OfferResponse::from(&offer)))
}

async fn remove(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services::delete_offer(state.store.as_ref(), &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the expired offer-product sweep now
async fn sweep(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
) -> Result<Json<SweepReport>> {
    tracing::info!("Sweep triggered by admin {}", admin.id);
    let report = services::deactivation_sweep(state.store.as_ref(), &state.cache, None).await?;
    Ok(Json(report))
}
