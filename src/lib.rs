//! Storefront REST API: catalog, carts, wishlists, offers and coupons,
//! delivery addresses, notifications and support requests.

pub mod addresses;
pub mod auth;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod offers;
pub mod requests;
pub mod routes;
pub mod wishlist;

use axum::Router;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::AppCache;
use crate::db::Store;
use crate::notifications::Notifier;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: AppCache,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cache: AppCache, notifier: Notifier) -> Self {
        Self {
            store,
            cache,
            notifier,
        }
    }
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(catalog::router())
        .merge(cart::router())
        .merge(wishlist::router())
        .merge(offers::router())
        .merge(addresses::router())
        .merge(notifications::router())
        .merge(requests::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::db::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_app() -> Router {
        let (notifier, _queue) = Notifier::channel(16);
        let state = AppState::new(Arc::new(MemoryStore::new()), AppCache::default(), notifier);
        app(state)
    }

    enum As {
        Anonymous,
        User(Uuid),
        Admin(Uuid),
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        who: As,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        match who {
            As::Anonymous => {}
            As::User(id) => builder = builder.header(USER_ID_HEADER, id.to_string()),
            As::Admin(id) => {
                builder = builder
                    .header(USER_ID_HEADER, id.to_string())
                    .header(USER_ROLE_HEADER, "admin")
            }
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn money(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    async fn create_standard_product(router: &Router, admin: Uuid) -> String {
        let (status, product) = call(
            router,
            Method::POST,
            "/api/products/standard",
            As::Admin(admin),
            Some(json!({ "title": "Kettle", "price": "40.00", "discountEligible": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        product["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_cart_line_delete_permissions() {
        let router = test_app();
        let admin = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let product_id = create_standard_product(&router, admin).await;

        let add = json!({ "userId": owner, "productId": product_id, "discount": "25" });
        let (status, line) =
            call(&router, Method::POST, "/api/cart", As::User(owner), Some(add.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(money(&line["finalPrice"]), dec!(30));
        let uri = format!("/api/cart/{}", line["id"].as_str().unwrap());

        let (status, _) = call(&router, Method::DELETE, &uri, As::User(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&router, Method::DELETE, &uri, As::User(owner), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, line) = call(&router, Method::POST, "/api/cart", As::User(owner), Some(add)).await;
        let uri = format!("/api/cart/{}", line["id"].as_str().unwrap());
        let (status, _) = call(&router, Method::DELETE, &uri, As::Admin(admin), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cart_add_for_another_user_is_forbidden() {
        let router = test_app();
        let product_id = create_standard_product(&router, Uuid::new_v4()).await;

        let body = json!({ "userId": Uuid::new_v4(), "productId": product_id });
        let (status, _) =
            call(&router, Method::POST, "/api/cart", As::User(Uuid::new_v4()), Some(body.clone()))
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&router, Method::POST, "/api/cart", As::Anonymous, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_guest_cart_flow() {
        let router = test_app();
        let product_id = create_standard_product(&router, Uuid::new_v4()).await;

        for quantity in [1, 2] {
            let body = json!({ "guestId": "guest-42", "productId": product_id, "quantity": quantity });
            let (status, _) = call(&router, Method::POST, "/api/cart", As::Anonymous, Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, cart) =
            call(&router, Method::GET, "/api/cart/guest/guest-42", As::Anonymous, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
        assert_eq!(cart["lines"][0]["quantity"], 3);
        assert_eq!(money(&cart["total"]), dec!(120));

        let uri = format!("/api/cart/{}", cart["lines"][0]["id"].as_str().unwrap());
        let (status, _) = call(&router, Method::DELETE, &uri, As::Anonymous, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(
            &router,
            Method::DELETE,
            &format!("{}?guestId=someone-else", uri),
            As::Anonymous,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(
            &router,
            Method::DELETE,
            &format!("{}?guestId=guest-42", uri),
            As::Anonymous,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_coupon_validation_is_public() {
        let router = test_app();
        let admin = Uuid::new_v4();
        let product_id = create_standard_product(&router, admin).await;
        let now = Utc::now();

        let offer = json!({
            "name": "Welcome",
            "type": "coupon",
            "discountType": "percentage",
            "discountValue": "15",
            "couponCode": "welcome15",
            "products": [product_id],
            "startDate": now - Duration::hours(1),
            "endDate": now + Duration::days(30),
        });
        let (status, _) =
            call(&router, Method::POST, "/api/offers", As::User(Uuid::new_v4()), Some(offer.clone()))
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, created) =
            call(&router, Method::POST, "/api/offers", As::Admin(admin), Some(offer)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["couponCode"], "WELCOME15");

        let (status, snapshot) = call(
            &router,
            Method::POST,
            "/api/coupons/validate",
            As::Anonymous,
            Some(json!({ "code": "Welcome15" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["code"], "WELCOME15");
        assert_eq!(snapshot["discountType"], "percentage");
        assert_eq!(snapshot["couponApplyTo"], "first");
        assert_eq!(snapshot["products"], json!([product_id]));

        let (status, error) = call(
            &router,
            Method::POST,
            "/api/coupons/validate",
            As::Anonymous,
            Some(json!({ "code": "NOPE" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_offer_rejects_backwards_window() {
        let router = test_app();
        let admin = Uuid::new_v4();
        let product_id = create_standard_product(&router, admin).await;
        let now = Utc::now();

        let (status, error) = call(
            &router,
            Method::POST,
            "/api/offers",
            As::Admin(admin),
            Some(json!({
                "name": "Backwards",
                "type": "discount",
                "discountType": "value",
                "discountValue": "5",
                "products": [product_id],
                "startDate": now,
                "endDate": now,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["message"], "startDate must be before endDate");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let router = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/coupons/validate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_type"], "validation_error");
    }

    #[tokio::test]
    async fn test_address_default_endpoint() {
        let router = test_app();
        let user = Uuid::new_v4();
        let address = |name: &str| {
            json!({
                "name": name,
                "phone": "0100",
                "city": "Cairo",
                "governorate": "Cairo",
                "street": "Tahrir",
            })
        };

        let (_, a) = call(&router, Method::POST, "/api/addresses", As::User(user), Some(address("A"))).await;
        let (_, b) = call(&router, Method::POST, "/api/addresses", As::User(user), Some(address("B"))).await;

        for target in [&a, &b] {
            let uri = format!("/api/addresses/{}/default", target["id"].as_str().unwrap());
            let (status, updated) = call(&router, Method::PUT, &uri, As::User(user), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(updated["isDefault"], true);
        }

        let (_, listed) = call(&router, Method::GET, "/api/addresses", As::User(user), None).await;
        let defaults: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["isDefault"] == true)
            .map(|a| a["id"].clone())
            .collect();
        assert_eq!(defaults, vec![b["id"].clone()]);

        let uri = format!("/api/addresses/{}/default", a["id"].as_str().unwrap());
        let (status, _) = call(&router, Method::PUT, &uri, As::User(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&test_app(), Method::GET, "/health", As::Anonymous, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
