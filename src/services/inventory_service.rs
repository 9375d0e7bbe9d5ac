use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::inventory::{OverrideList, OverrideView, UpsertOverrideRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_allowed},
    models::PriceOverride,
    policy::{Action, Resource},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct OverrideWithProductRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    category: String,
    image_url: Option<String>,
    price_per_kg: Decimal,
    stock_kg: Decimal,
}

pub async fn list_my_overrides(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<OverrideList>> {
    ensure_allowed(user, Resource::Inventory, Action::Read)?;

    let rows: Vec<OverrideWithProductRow> = sqlx::query_as(
        r#"
        SELECT o.id, o.product_id, p.name, p.category, p.image_url,
               o.price_per_kg, o.stock_kg
        FROM price_overrides o
        JOIN products p ON p.id = o.product_id
        WHERE o.seller_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| OverrideView {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            category: row.category,
            image_url: row.image_url,
            price_per_kg: row.price_per_kg,
            stock_kg: row.stock_kg,
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OverrideList { items },
        Some(Meta::empty()),
    ))
}

/// Create or replace the caller's price/stock entry for a product. The
/// unique (seller, product) key keeps it to one row per pair.
pub async fn upsert_override(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpsertOverrideRequest,
) -> AppResult<ApiResponse<PriceOverride>> {
    ensure_allowed(user, Resource::Inventory, Action::Write)?;

    if payload.price_per_kg <= Decimal::ZERO {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    if payload.stock_kg < Decimal::ZERO {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".into()));
    }

    let record: PriceOverride = sqlx::query_as(
        r#"
        INSERT INTO price_overrides (id, seller_id, product_id, seller_role, price_per_kg, stock_kg)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (seller_id, product_id)
        DO UPDATE SET price_per_kg = EXCLUDED.price_per_kg,
                      stock_kg = EXCLUDED.stock_kg,
                      updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(user.role.as_str())
    .bind(payload.price_per_kg)
    .bind(payload.stock_kg)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "override_upsert",
        Some("price_overrides"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "price_per_kg": payload.price_per_kg,
        })),
    )
    .await;

    Ok(ApiResponse::success("Saved", record, None))
}

pub async fn delete_override(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Resource::Inventory, Action::Write)?;

    let result = sqlx::query("DELETE FROM price_overrides WHERE seller_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "override_delete",
        Some("price_overrides"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
