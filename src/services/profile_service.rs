use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::profile::{AddAddressRequest, AddressList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_allowed},
    models::{Address, User},
    policy::{Action, Resource},
    response::{ApiResponse, Meta},
};

pub async fn me(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let row: Option<User> =
        sqlx::query_as("SELECT id, email, name, role, created_at FROM users WHERE id = $1")
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some(profile) => Ok(ApiResponse::success("OK", profile, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_addresses(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    ensure_allowed(user, Resource::Addresses, Action::Read)?;

    let items: Vec<Address> = sqlx::query_as(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn add_address(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    ensure_allowed(user, Resource::Addresses, Action::Write)?;

    if payload.pincode.len() != 6 || !payload.pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("pincode must be 6 digits".into()));
    }

    let address: Address = sqlx::query_as(
        r#"
        INSERT INTO addresses (id, user_id, name, phone, pincode, state, city, street)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.name)
    .bind(payload.phone)
    .bind(payload.pincode)
    .bind(payload.state)
    .bind(payload.city)
    .bind(payload.street)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "address_add",
        Some("addresses"),
        Some(serde_json::json!({ "address_id": address.id })),
    )
    .await;

    Ok(ApiResponse::success("Address saved", address, None))
}

pub async fn delete_address(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Resource::Addresses, Action::Write)?;

    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Address removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
