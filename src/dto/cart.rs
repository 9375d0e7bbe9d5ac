use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The client submits a product and a quantity only; the server resolves
/// the price. Computed totals are never accepted from the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    #[schema(value_type = String)]
    pub total_quantity_kg: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    /// Set when the cart cannot proceed to checkout; names the limit
    /// breached.
    pub checkout_block: Option<String>,
}
