use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_allowed},
    models::CartItem,
    policy::{self, Action, Resource, supplier_tier},
    pricing,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartWithProductRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    image_url: Option<String>,
    price_per_kg: Decimal,
    quantity_kg: Decimal,
    line_total: Decimal,
}

/// The price the server charges this buyer per kg right now: mean of the
/// supplier tier's overrides with the buyer's daily discount applied.
/// Products with no overrides price to zero rather than failing.
async fn resolve_unit_price(pool: &DbPool, user: &AuthUser, product_id: Uuid) -> AppResult<Decimal> {
    let tier = supplier_tier(user.role);
    let base: (Decimal,) = sqlx::query_as(
        r#"
        SELECT COALESCE(AVG(price_per_kg), 0)
        FROM price_overrides
        WHERE product_id = $1 AND seller_role = $2
        "#,
    )
    .bind(product_id)
    .bind(tier.as_str())
    .fetch_one(pool)
    .await?;

    let today = Utc::now().date_naive();
    let discount = pricing::daily_discount_percent(user.user_id, user.role, today);
    Ok(pricing::unit_price(base.0, discount))
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_allowed(user, Resource::Cart, Action::Read)?;

    let rows: Vec<CartWithProductRow> = sqlx::query_as(
        r#"
        SELECT ci.id, ci.product_id, p.name, p.image_url,
               ci.price_per_kg, ci.quantity_kg, ci.line_total
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let items: Vec<CartLine> = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            image_url: row.image_url,
            price_per_kg: row.price_per_kg,
            quantity_kg: row.quantity_kg,
            line_total: row.line_total,
        })
        .collect();

    let total_quantity_kg: Decimal = items.iter().map(|line| line.quantity_kg).sum();
    let total_price: Decimal = items.iter().map(|line| line.line_total).sum();
    let checkout_block =
        policy::check_checkout_limits(user.role, total_quantity_kg, total_price).err();

    let view = CartView {
        items,
        total_quantity_kg,
        total_price,
        checkout_block,
    };

    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_allowed(user, Resource::Cart, Action::Write)?;

    let quantity =
        policy::normalize_quantity(user.role, payload.quantity_kg).map_err(AppError::BadRequest)?;

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let unit = resolve_unit_price(pool, user, payload.product_id).await?;

    let exist: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;

    let cart_item = if let Some(item) = exist {
        // Same product again: merge by summing quantities, re-validated
        // against the role bounds, and reprice at today's rate.
        let merged = policy::normalize_quantity(user.role, item.quantity_kg + quantity)
            .map_err(AppError::BadRequest)?;
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity_kg = $3, price_per_kg = $4, line_total = $5
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(user.user_id)
        .bind(merged)
        .bind(unit)
        .bind(pricing::line_total(unit, merged))
        .fetch_one(pool)
        .await?
    } else {
        sqlx::query_as(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, price_per_kg, quantity_kg, line_total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .bind(unit)
        .bind(quantity)
        .bind(pricing::line_total(unit, quantity))
        .fetch_one(pool)
        .await?
    };

    audit::record(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "quantity_kg": cart_item.quantity_kg,
        })),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn update_quantity(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_allowed(user, Resource::Cart, Action::Write)?;

    // Validation happens before any write; a rejected quantity leaves the
    // stored line untouched.
    let quantity =
        policy::normalize_quantity(user.role, payload.quantity_kg).map_err(AppError::BadRequest)?;

    let exist: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;

    let item = match exist {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let cart_item: CartItem = sqlx::query_as(
        r#"
        UPDATE cart_items
        SET quantity_kg = $3, line_total = $4
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(item.id)
    .bind(user.user_id)
    .bind(quantity)
    .bind(pricing::line_total(item.price_per_kg, quantity))
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity_kg": quantity })),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Resource::Cart, Action::Write)?;

    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
