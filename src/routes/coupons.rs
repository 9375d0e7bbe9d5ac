use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::coupons::{AppliedCoupon, ValidateCouponRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon preview against the current cart", body = ApiResponse<AppliedCoupon>),
        (status = 400, description = "Unknown, already used, or misconfigured coupon"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidateCouponRequest>,
) -> AppResult<Json<ApiResponse<AppliedCoupon>>> {
    let resp = coupon_service::validate_coupon(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}
