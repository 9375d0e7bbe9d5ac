use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Preview of a coupon against the caller's current cart subtotal. Nothing
/// is consumed until checkout.
#[derive(Debug, Serialize, ToSchema)]
pub struct AppliedCoupon {
    pub code: String,
    pub kind: String,
    #[schema(value_type = String)]
    pub value: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    /// percentage or flat
    pub kind: String,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<crate::models::Coupon>,
}
