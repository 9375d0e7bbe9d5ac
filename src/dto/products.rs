use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One package choice priced for the viewer.
#[derive(Debug, Serialize, ToSchema)]
pub struct PackageQuote {
    pub label: String,
    #[schema(value_type = String)]
    pub quantity_kg: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
}

/// A catalog product priced for the requesting role: base price is the
/// mean of matching seller overrides, unit price applies the day's
/// display discount.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductQuote {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    #[schema(value_type = String)]
    pub base_price_per_kg: Decimal,
    pub discount_percent: u32,
    #[schema(value_type = String)]
    pub unit_price_per_kg: Decimal,
    pub packages: Vec<PackageQuote>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductQuoteList {
    pub items: Vec<ProductQuote>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// vegetables or fruits
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}