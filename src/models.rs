use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A seller's price/stock entry for a catalog product, distinct from the
/// shared catalog row. At most one per (seller, product).
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct PriceOverride {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub seller_role: String,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub stock_kg: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub pincode: String,
    pub state: String,
    pub city: String,
    pub street: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a placed order. Immutable after creation except for `status`
/// and the actor-stamp fields the lifecycle transitions fill in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub placed_by: Uuid,
    pub placed_by_role: String,
    pub status: String,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub coupon_code: Option<String>,
    #[schema(value_type = String)]
    pub total_quantity_kg: Decimal,
    pub ship_name: String,
    pub ship_phone: String,
    pub ship_pincode: String,
    pub ship_state: String,
    pub ship_city: String,
    pub ship_street: String,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A storefront review. Submitter name and role are snapshotted so the
/// review survives account changes; images are URL strings only.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_role: String,
    pub rating: i16,
    pub comment: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SupportQuery {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub role: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// One message in a support thread. `sender` is "user" or "admin"; `read`
/// flips when the other side opens the thread.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SupportMessage {
    pub id: Uuid,
    pub query_id: Uuid,
    pub sender: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
