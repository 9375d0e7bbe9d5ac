use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::profile::{AddAddressRequest, AddressList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Address, User},
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/{id}", delete(delete_address))
}

#[utoipa::path(
    get,
    path = "/api/profile/me",
    responses(
        (status = 200, description = "The caller's profile", body = ApiResponse<User>),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::me(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/profile/addresses",
    responses(
        (status = 200, description = "Saved delivery addresses", body = ApiResponse<AddressList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = profile_service::list_addresses(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/profile/addresses",
    request_body = AddAddressRequest,
    responses(
        (status = 200, description = "Save an address", body = ApiResponse<Address>),
        (status = 400, description = "Invalid pincode"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddAddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = profile_service::add_address(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/profile/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = profile_service::delete_address(&state.pool, &user, id).await?;
    Ok(Json(resp))
}
