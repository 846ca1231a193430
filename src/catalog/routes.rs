//! Catalog route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AdminIdentity;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::AppState;

use super::models::{ProductKind, ProductRef};
use super::requests::ProductRequest;
use super::responses::ProductResponse;
use super::services::{self, ProductRemoval};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products/:kind", get(list).post(create))
        .route(
            "/api/products/:kind/:id",
            get(detail).put(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<ProductResponse>>> {
    let kind: ProductKind = kind.parse()?;
    let products = services::list_products(state.store.as_ref(), kind).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path(kind): Path<String>,
    JsonBody(request): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let kind: ProductKind = kind.parse()?;
    let product = services::create_product(state.store.as_ref(), kind, request).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

async fn detail(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ProductResponse>> {
    let reference = ProductRef::new(kind.parse()?, id);
    let product = services::get_product(state.store.as_ref(), &state.cache, reference).await?;
    Ok(Json(ProductResponse::from(product.as_ref())))
}

async fn update(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path((kind, id)): Path<(String, Uuid)>,
    JsonBody(request): JsonBody<ProductRequest>,
) -> Result<Json<ProductResponse>> {
    let reference = ProductRef::new(kind.parse()?, id);
    let product =
        services::update_product(state.store.as_ref(), &state.cache, reference, request).await?;
    Ok(Json(ProductResponse::from(&product)))
}

async fn remove(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<ProductRemoval>> {
    let reference = ProductRef::new(kind.parse()?, id);
    let removal = services::delete_product(state.store.as_ref(), &state.cache, reference).await?;
    Ok(Json(removal))
}
