use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::inventory::{OverrideList, UpsertOverrideRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PriceOverride,
    response::ApiResponse,
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overrides", get(list_overrides).put(upsert_override))
        .route("/overrides/{product_id}", delete(delete_override))
}

#[utoipa::path(
    get,
    path = "/api/inventory/overrides",
    responses(
        (status = 200, description = "The caller's price and stock entries", body = ApiResponse<OverrideList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_overrides(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OverrideList>>> {
    let resp = inventory_service::list_my_overrides(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/inventory/overrides",
    request_body = UpsertOverrideRequest,
    responses(
        (status = 200, description = "Create or replace the caller's entry for a product", body = ApiResponse<PriceOverride>),
        (status = 400, description = "Invalid price or stock"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn upsert_override(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertOverrideRequest>,
) -> AppResult<Json<ApiResponse<PriceOverride>>> {
    let resp = inventory_service::upsert_override(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/overrides/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No entry for that product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn delete_override(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = inventory_service::delete_override(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}
