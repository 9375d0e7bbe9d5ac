use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::UserList,
        coupons::{CouponList, CreateCouponRequest},
        orders::{OrderList, OrderWithItems},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Coupon, Product, User},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::{coupon_service, order_service},
    state::AppState,
};

/// Admin view across every order regardless of who placed it.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_service::order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = pagination.normalize();

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    let items: Vec<User> = sqlx::query_as(
        r#"
        SELECT id, email, name, role, created_at FROM users
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", UserList { items }, Some(meta)))
}

fn validate_category(category: &str) -> Result<(), AppError> {
    match category {
        "vegetables" | "fruits" => Ok(()),
        _ => Err(AppError::BadRequest(
            "category must be vegetables or fruits".into(),
        )),
    }
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_category(&payload.category)?;

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, category, image_url)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(payload.category)
    .bind(payload.image_url)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success("Product created", product, None))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    if let Some(category) = payload.category.as_deref() {
        validate_category(category)?;
    }

    let product: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products
        SET name = COALESCE($2, name),
            category = COALESCE($3, category),
            image_url = COALESCE($4, image_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name)
    .bind(payload.category)
    .bind(payload.image_url)
    .fetch_optional(&state.pool)
    .await?;

    let product = product.ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success("Product updated", product, None))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_coupons(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(user)?;

    let items: Vec<Coupon> = sqlx::query_as("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        CouponList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;

    let code = coupon_service::normalize_code(&payload.code).map_err(AppError::BadRequest)?;

    match payload.kind.as_str() {
        "percentage" => {
            if payload.value <= Decimal::ZERO || payload.value > dec!(100) {
                return Err(AppError::BadRequest(
                    "percentage must be between 0 and 100".into(),
                ));
            }
        }
        "flat" => {
            if payload.value <= Decimal::ZERO {
                return Err(AppError::BadRequest("flat value must be positive".into()));
            }
        }
        _ => {
            return Err(AppError::BadRequest(
                "kind must be percentage or flat".into(),
            ));
        }
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM coupons WHERE code = $1")
        .bind(code.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Coupon code already exists".into()));
    }

    let coupon: Coupon = sqlx::query_as(
        r#"
        INSERT INTO coupons (id, code, kind, value, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code.as_str())
    .bind(payload.kind)
    .bind(payload.value)
    .bind(payload.description)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        Some("coupons"),
        Some(serde_json::json!({ "code": code })),
    )
    .await;

    Ok(ApiResponse::success("Coupon created", coupon, None))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "coupon_delete",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
