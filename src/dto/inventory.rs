use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertOverrideRequest {
    pub product_id: Uuid,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub stock_kg: Decimal,
}

/// A seller's override joined with its catalog product.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverrideView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    #[schema(value_type = String)]
    pub price_per_kg: Decimal,
    #[schema(value_type = String)]
    pub stock_kg: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverrideList {
    pub items: Vec<OverrideView>,
}
