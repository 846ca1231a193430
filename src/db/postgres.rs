//! Postgres store.
//!
//! Rows are read into `*Row` structs with sqlx's FromRow derive and then
//! converted into domain models, since enums are stored as plain text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    AddressStore, CartStore, CatalogStore, NotificationStore, OfferStore, RequestStore, UserStore,
    WishlistStore,
};
use crate::addresses::models::Address;
use crate::cart::models::{CartLine, Owner};
use crate::catalog::models::{Product, ProductKind, ProductRef};
use crate::error::{AppError, Result};
use crate::notifications::models::Notification;
use crate::offers::models::Offer;
use crate::requests::models::{RequestStatus, SupportRequest};
use crate::wishlist::models::WishlistEntry;

/// sqlx-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

// ==================== Row types ====================

const PRODUCT_COLUMNS: &str = r#"
    id, kind, title, description, brand, category, price, discount_eligible,
    images, starts_at, ends_at, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    kind: String,
    title: String,
    description: String,
    brand: String,
    category: String,
    price: Decimal,
    discount_eligible: bool,
    images: Vec<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            id: row.id,
            kind: stored(row.kind.parse())?,
            title: row.title,
            description: row.description,
            brand: row.brand,
            category: row.category,
            price: row.price,
            discount_eligible: row.discount_eligible,
            images: row.images,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CART_COLUMNS: &str = r#"
    id, owner_kind, owner_key, product_kind, product_id, quantity, status,
    coupon_code, discount, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: Uuid,
    owner_kind: String,
    owner_key: String,
    product_kind: String,
    product_id: Uuid,
    quantity: i32,
    status: String,
    coupon_code: Option<String>,
    discount: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = AppError;

    fn try_from(row: CartLineRow) -> Result<Self> {
        Ok(CartLine {
            id: row.id,
            owner: Owner::from_parts(&row.owner_kind, &row.owner_key)?,
            product: ProductRef::new(stored(row.product_kind.parse())?, row.product_id),
            quantity: row.quantity,
            status: stored(row.status.parse())?,
            coupon_code: row.coupon_code,
            discount: row.discount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct WishlistRow {
    id: Uuid,
    owner_kind: String,
    owner_key: String,
    product_kind: String,
    product_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<WishlistRow> for WishlistEntry {
    type Error = AppError;

    fn try_from(row: WishlistRow) -> Result<Self> {
        Ok(WishlistEntry {
            id: row.id,
            owner: Owner::from_parts(&row.owner_kind, &row.owner_key)?,
            product: ProductRef::new(stored(row.product_kind.parse())?, row.product_id),
            created_at: row.created_at,
        })
    }
}

const OFFER_COLUMNS: &str = r#"
    id, name, kind, discount_kind, discount_value, coupon_code, products,
    starts_at, ends_at, active, apply_to, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct OfferRow {
    id: Uuid,
    name: String,
    kind: String,
    discount_kind: String,
    discount_value: Decimal,
    coupon_code: String,
    products: Vec<Uuid>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    active: bool,
    apply_to: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = AppError;

    fn try_from(row: OfferRow) -> Result<Self> {
        Ok(Offer {
            id: row.id,
            name: row.name,
            kind: stored(row.kind.parse())?,
            discount_kind: stored(row.discount_kind.parse())?,
            discount_value: row.discount_value,
            coupon_code: row.coupon_code,
            products: row.products,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            active: row.active,
            apply_to: stored(row.apply_to.parse())?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ADDRESS_COLUMNS: &str = r#"
    id, owner_id, name, phone, city, governorate, street, building_number,
    is_default, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct AddressRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    phone: String,
    city: String,
    governorate: String,
    street: String,
    building_number: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            phone: row.phone,
            city: row.city,
            governorate: row.governorate,
            street: row.street,
            building_number: row.building_number,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = r#"
    id, recipient_id, kind, title, message, related_order_id, related_user_id,
    is_read, metadata, created_at
"#;

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_order_id: Option<Uuid>,
    related_user_id: Option<Uuid>,
    is_read: bool,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            kind: stored(row.kind.parse())?,
            title: row.title,
            message: row.message,
            related_order_id: row.related_order_id,
            related_user_id: row.related_user_id,
            is_read: row.is_read,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

const REQUEST_COLUMNS: &str = r#"
    id, requester_id, subject, message, contact_email, contact_phone, status,
    admin_response, responded_by, responded_at, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    requester_id: Uuid,
    subject: String,
    message: String,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    status: String,
    admin_response: Option<String>,
    responded_by: Option<Uuid>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for SupportRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(SupportRequest {
            id: row.id,
            requester_id: row.requester_id,
            subject: row.subject,
            message: row.message,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            status: stored(row.status.parse())?,
            admin_response: row.admin_response,
            responded_by: row.responded_by,
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A stored enum that fails to parse is corrupt data, not bad client input
fn stored<T>(parsed: Result<T>) -> Result<T> {
    parsed.map_err(|e| AppError::Internal(format!("Corrupt stored value: {}", e)))
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ==================== Catalog ====================

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, kind, title, description, brand, category, price, discount_eligible,
                images, starts_at, ends_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id)
        .bind(product.kind.as_str())
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.discount_eligible)
        .bind(&product.images)
        .bind(product.starts_at)
        .bind(product.ends_at)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = $3, description = $4, brand = $5, category = $6, price = $7,
                discount_eligible = $8, images = $9, starts_at = $10, ends_at = $11,
                updated_at = $12
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(product.kind.as_str())
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.discount_eligible)
        .bind(&product.images)
        .bind(product.starts_at)
        .bind(product.ends_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_product(&self, reference: ProductRef) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE kind = $1 AND id = $2",
            PRODUCT_COLUMNS
        ))
        .bind(reference.kind().as_str())
        .bind(reference.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE kind = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn delete_product(&self, reference: ProductRef) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE kind = $1 AND id = $2")
            .bind(reference.kind().as_str())
            .bind(reference.id())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn existing_product_ids(&self, kind: ProductKind, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let found: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM products WHERE kind = $1 AND id = ANY($2)")
                .bind(kind.as_str())
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(found)
    }

    async fn expired_offer_products(&self, check_time: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM products
            WHERE kind = 'offer'
              AND ends_at IS NOT NULL
              AND ends_at <= $1
            "#,
        )
        .bind(check_time)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

// ==================== Cart ====================

#[async_trait]
impl CartStore for PgStore {
    async fn find_cart_line(&self, owner: &Owner, product: ProductRef) -> Result<Option<CartLine>> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            r#"
            SELECT {} FROM cart_lines
            WHERE owner_kind = $1 AND owner_key = $2
              AND product_kind = $3 AND product_id = $4
            "#,
            CART_COLUMNS
        ))
        .bind(owner.kind_str())
        .bind(owner.key())
        .bind(product.kind().as_str())
        .bind(product.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn insert_cart_line(&self, line: &CartLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (
                id, owner_kind, owner_key, product_kind, product_id, quantity, status,
                coupon_code, discount, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(line.id)
        .bind(line.owner.kind_str())
        .bind(line.owner.key())
        .bind(line.product.kind().as_str())
        .bind(line.product.id())
        .bind(line.quantity)
        .bind(line.status.as_str())
        .bind(&line.coupon_code)
        .bind(line.discount)
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_cart_line(&self, line: &CartLine) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cart_lines
            SET owner_kind = $2, owner_key = $3, quantity = $4, status = $5,
                coupon_code = $6, discount = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(line.id)
        .bind(line.owner.kind_str())
        .bind(line.owner.key())
        .bind(line.quantity)
        .bind(line.status.as_str())
        .bind(&line.coupon_code)
        .bind(line.discount)
        .bind(line.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_cart_line(&self, id: Uuid) -> Result<Option<CartLine>> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {} FROM cart_lines WHERE id = $1",
            CART_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn list_cart_lines(&self, owner: &Owner) -> Result<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {} FROM cart_lines WHERE owner_kind = $1 AND owner_key = $2 ORDER BY seq",
            CART_COLUMNS
        ))
        .bind(owner.kind_str())
        .bind(owner.key())
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn delete_cart_line(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_cart_lines_for_product(&self, product: ProductRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE product_kind = $1 AND product_id = $2")
            .bind(product.kind().as_str())
            .bind(product.id())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// ==================== Wishlist ====================

const WISHLIST_COLUMNS: &str = "id, owner_kind, owner_key, product_kind, product_id, created_at";

#[async_trait]
impl WishlistStore for PgStore {
    async fn find_wishlist_entry(
        &self,
        owner: &Owner,
        product: ProductRef,
    ) -> Result<Option<WishlistEntry>> {
        let row = sqlx::query_as::<_, WishlistRow>(&format!(
            r#"
            SELECT {} FROM wishlist_entries
            WHERE owner_kind = $1 AND owner_key = $2
              AND product_kind = $3 AND product_id = $4
            LIMIT 1
            "#,
            WISHLIST_COLUMNS
        ))
        .bind(owner.kind_str())
        .bind(owner.key())
        .bind(product.kind().as_str())
        .bind(product.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WishlistEntry::try_from).transpose()
    }

    async fn insert_wishlist_entry(&self, entry: &WishlistEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wishlist_entries (id, owner_kind, owner_key, product_kind, product_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.owner.kind_str())
        .bind(entry.owner.key())
        .bind(entry.product.kind().as_str())
        .bind(entry.product.id())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>> {
        let row = sqlx::query_as::<_, WishlistRow>(&format!(
            "SELECT {} FROM wishlist_entries WHERE id = $1",
            WISHLIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WishlistEntry::try_from).transpose()
    }

    async fn list_wishlist_entries(&self, owner: &Owner) -> Result<Vec<WishlistEntry>> {
        let rows = sqlx::query_as::<_, WishlistRow>(&format!(
            "SELECT {} FROM wishlist_entries WHERE owner_kind = $1 AND owner_key = $2 ORDER BY seq",
            WISHLIST_COLUMNS
        ))
        .bind(owner.kind_str())
        .bind(owner.key())
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn delete_wishlist_entry(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_wishlist_entries_for_product(&self, product: ProductRef) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM wishlist_entries WHERE product_kind = $1 AND product_id = $2")
                .bind(product.kind().as_str())
                .bind(product.id())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

// ==================== Offers ====================

#[async_trait]
impl OfferStore for PgStore {
    async fn insert_offer(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (
                id, name, kind, discount_kind, discount_value, coupon_code, products,
                starts_at, ends_at, active, apply_to, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(offer.kind.as_str())
        .bind(offer.discount_kind.as_str())
        .bind(offer.discount_value)
        .bind(&offer.coupon_code)
        .bind(&offer.products)
        .bind(offer.starts_at)
        .bind(offer.ends_at)
        .bind(offer.active)
        .bind(offer.apply_to.as_str())
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_offer(&self, offer: &Offer) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE offers
            SET name = $2, kind = $3, discount_kind = $4, discount_value = $5,
                coupon_code = $6, products = $7, starts_at = $8, ends_at = $9,
                active = $10, apply_to = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(offer.kind.as_str())
        .bind(offer.discount_kind.as_str())
        .bind(offer.discount_value)
        .bind(&offer.coupon_code)
        .bind(&offer.products)
        .bind(offer.starts_at)
        .bind(offer.ends_at)
        .bind(offer.active)
        .bind(offer.apply_to.as_str())
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {} FROM offers WHERE id = $1",
            OFFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Offer::try_from).transpose()
    }

    async fn list_offers(&self) -> Result<Vec<Offer>> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {} FROM offers ORDER BY created_at DESC",
            OFFER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn delete_offer(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_offers(&self, check_time: DateTime<Utc>) -> Result<Vec<Offer>> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r#"
            SELECT {} FROM offers
            WHERE active = true
              AND starts_at <= $1
              AND ends_at > $1
            ORDER BY created_at DESC
            "#,
            OFFER_COLUMNS
        ))
        .bind(check_time)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn find_active_coupon(
        &self,
        normalized_code: &str,
        check_time: DateTime<Utc>,
    ) -> Result<Option<Offer>> {
        // Plain equality on the uppercased code: the input is never treated as a pattern.
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            r#"
            SELECT {} FROM offers
            WHERE kind = 'coupon'
              AND coupon_code <> ''
              AND UPPER(coupon_code) = $1
              AND active = true
              AND starts_at <= $2
              AND ends_at > $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
            OFFER_COLUMNS
        ))
        .bind(normalized_code)
        .bind(check_time)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Offer::try_from).transpose()
    }
}

// ==================== Addresses ====================

#[async_trait]
impl AddressStore for PgStore {
    async fn insert_address(&self, address: &Address) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query(
                r#"
                UPDATE addresses SET is_default = false, updated_at = $3
                WHERE owner_id = $1 AND id <> $2 AND is_default = true
                "#,
            )
            .bind(address.owner_id)
            .bind(address.id)
            .bind(address.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, owner_id, name, phone, city, governorate, street, building_number,
                is_default, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(address.id)
        .bind(address.owner_id)
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.city)
        .bind(&address.governorate)
        .bind(&address.street)
        .bind(&address.building_number)
        .bind(address.is_default)
        .bind(address.created_at)
        .bind(address.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_address(&self, address: &Address) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query(
                r#"
                UPDATE addresses SET is_default = false, updated_at = $3
                WHERE owner_id = $1 AND id <> $2 AND is_default = true
                "#,
            )
            .bind(address.owner_id)
            .bind(address.id)
            .bind(address.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE addresses
            SET name = $2, phone = $3, city = $4, governorate = $5, street = $6,
                building_number = $7, is_default = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(address.id)
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.city)
        .bind(&address.governorate)
        .bind(&address.street)
        .bind(&address.building_number)
        .bind(address.is_default)
        .bind(address.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {} FROM addresses WHERE id = $1",
            ADDRESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    async fn list_addresses(&self, owner_id: Uuid) -> Result<Vec<Address>> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {} FROM addresses WHERE owner_id = $1 ORDER BY seq",
            ADDRESS_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn delete_address(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_default_address(&self, owner_id: Uuid, address_id: Uuid) -> Result<Option<Address>> {
        // One statement clears the old default and sets the new one.
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            r#"
            UPDATE addresses
            SET is_default = (id = $2), updated_at = now()
            WHERE owner_id = $1
              AND (is_default = true OR id = $2)
              AND EXISTS (SELECT 1 FROM addresses WHERE id = $2 AND owner_id = $1)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        ))
        .bind(owner_id)
        .bind(address_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(Address::from)
            .find(|a| a.id == address_id))
    }
}

// ==================== Notifications ====================

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, kind, title, message, related_order_id, related_user_id,
                is_read, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_order_id)
        .bind(notification.related_user_id)
        .bind(notification.is_read)
        .bind(&notification.metadata)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {} FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn mark_notification_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            UPDATE notifications SET is_read = true
            WHERE id = $1 AND recipient_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn delete_notification(&self, recipient_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ==================== Support requests ====================

#[async_trait]
impl RequestStore for PgStore {
    async fn insert_request(&self, request: &SupportRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO support_requests (
                id, requester_id, subject, message, contact_email, contact_phone, status,
                admin_response, responded_by, responded_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(&request.contact_email)
        .bind(&request.contact_phone)
        .bind(request.status.as_str())
        .bind(&request.admin_response)
        .bind(request.responded_by)
        .bind(request.responded_at)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_request(&self, request: &SupportRequest) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE support_requests
            SET status = $2, admin_response = $3, responded_by = $4, responded_at = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.status.as_str())
        .bind(&request.admin_response)
        .bind(request.responded_by)
        .bind(request.responded_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<SupportRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM support_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SupportRequest::try_from).transpose()
    }

    async fn list_requests(
        &self,
        requester_id: Option<Uuid>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<SupportRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {} FROM support_requests
            WHERE ($1::uuid IS NULL OR requester_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            REQUEST_COLUMNS
        ))
        .bind(requester_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM support_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ==================== Users ====================

#[async_trait]
impl UserStore for PgStore {
    async fn admin_ids(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin'")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
