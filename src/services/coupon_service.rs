use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    db::DbPool,
    dto::coupons::{AppliedCoupon, ValidateCouponRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_allowed},
    models::Coupon,
    policy::{Action, Resource},
    pricing,
    response::{ApiResponse, Meta},
};

/// Uppercase the code the way the storefront always did.
pub fn normalize_code(code: &str) -> Result<String, String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err("Please enter a coupon code".to_string());
    }
    Ok(trimmed.to_uppercase())
}

/// Reuse is rejected from the caller's used set before any coupon lookup.
pub fn check_unused(code: &str, used: &HashSet<String>) -> Result<(), String> {
    if used.contains(code) {
        return Err("You've already used this coupon".to_string());
    }
    Ok(())
}

/// Discount for a validated coupon: percentage of the subtotal, or a flat
/// amount capped at the subtotal so the discount can never exceed it.
pub fn compute_discount(kind: &str, value: Decimal, subtotal: Decimal) -> Result<Decimal, String> {
    match kind {
        "percentage" => {
            if value <= Decimal::ZERO || value > dec!(100) {
                return Err("invalid discount percentage".to_string());
            }
            Ok(pricing::round2(subtotal * value / dec!(100)))
        }
        "flat" => {
            if value <= Decimal::ZERO {
                return Err("invalid coupon configuration".to_string());
            }
            Ok(pricing::round2(value.min(subtotal)))
        }
        _ => Err("invalid coupon configuration".to_string()),
    }
}

pub async fn used_codes(pool: &DbPool, user_id: uuid::Uuid) -> AppResult<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT code FROM used_coupons WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(code,)| code).collect())
}

/// Preview a coupon against the caller's current cart subtotal. Read-only:
/// the code is consumed only inside the checkout transaction.
pub async fn validate_coupon(
    pool: &DbPool,
    user: &AuthUser,
    payload: ValidateCouponRequest,
) -> AppResult<ApiResponse<AppliedCoupon>> {
    ensure_allowed(user, Resource::Coupons, Action::Read)?;

    let code = normalize_code(&payload.code).map_err(AppError::BadRequest)?;
    let used = used_codes(pool, user.user_id).await?;
    check_unused(&code, &used).map_err(AppError::BadRequest)?;

    let coupon: Option<Coupon> = sqlx::query_as("SELECT * FROM coupons WHERE code = $1")
        .bind(code.as_str())
        .fetch_optional(pool)
        .await?;
    let coupon = match coupon {
        Some(c) => c,
        None => return Err(AppError::BadRequest("Invalid coupon code".into())),
    };

    let subtotal: (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(line_total), 0) FROM cart_items WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;

    let discount =
        compute_discount(&coupon.kind, coupon.value, subtotal.0).map_err(AppError::BadRequest)?;

    let applied = AppliedCoupon {
        description: coupon
            .description
            .clone()
            .unwrap_or_else(|| format!("{} discount", coupon.code)),
        code: coupon.code,
        kind: coupon.kind,
        value: coupon.value,
        discount,
    };

    Ok(ApiResponse::success(
        "Coupon valid",
        applied,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_uppercased_and_blank_rejected() {
        assert_eq!(normalize_code("  flat50 "), Ok("FLAT50".to_string()));
        assert!(normalize_code("   ").is_err());
    }

    #[test]
    fn reuse_is_rejected_before_any_lookup() {
        let used: HashSet<String> = ["FLAT50".to_string()].into_iter().collect();
        assert_eq!(
            check_unused("FLAT50", &used),
            Err("You've already used this coupon".to_string())
        );
        assert_eq!(check_unused("SAVE10", &used), Ok(()));
    }

    #[test]
    fn percentage_over_100_is_invalid() {
        assert_eq!(
            compute_discount("percentage", dec!(150), dec!(200)),
            Err("invalid discount percentage".to_string())
        );
        assert_eq!(
            compute_discount("percentage", dec!(0), dec!(200)),
            Err("invalid discount percentage".to_string())
        );
    }

    #[test]
    fn percentage_discount_of_subtotal() {
        assert_eq!(compute_discount("percentage", dec!(10), dec!(250)), Ok(dec!(25.00)));
        assert_eq!(compute_discount("percentage", dec!(100), dec!(80)), Ok(dec!(80.00)));
    }

    #[test]
    fn flat_discount_is_capped_at_subtotal() {
        // cart [{40/kg, 2kg}] -> subtotal 80; FLAT50 -> discount 50, total 30
        let subtotal = dec!(80);
        let discount = compute_discount("flat", dec!(50), subtotal).unwrap();
        assert_eq!(discount, dec!(50));
        assert_eq!(subtotal - discount, dec!(30));

        assert_eq!(compute_discount("flat", dec!(120), dec!(80)), Ok(dec!(80)));
    }

    #[test]
    fn unknown_kind_is_invalid_configuration() {
        assert_eq!(
            compute_discount("bogo", dec!(1), dec!(10)),
            Err("invalid coupon configuration".to_string())
        );
    }
}
