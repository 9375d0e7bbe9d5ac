use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::Entity as Products,
        used_coupons::{ActiveModel as UsedCouponActive, Column as UsedCouponCol, Entity as UsedCoupons},
    },
    error::{AppError, AppResult},
    lifecycle::{self, OrderStatus},
    middleware::auth::{AuthUser, ensure_allowed},
    models::{Order, OrderItem},
    policy::{self, Action, Resource, Role},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::coupon_service,
    state::AppState,
};

/// Snapshot the cart into a Confirmed order. Everything happens in one
/// transaction: re-derive line totals, enforce checkout limits, consume the
/// coupon, write the order and its items, clear the cart. A failure at any
/// step leaves no partial state behind.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_allowed(user, Resource::Checkout, Action::Write)?;

    let txn = state.orm.begin().await?;

    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(payload.address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart_rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart_rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut total_quantity = Decimal::ZERO;
    let mut subtotal = Decimal::ZERO;
    for row in &cart_rows {
        let line = pricing::line_total(row.price_per_kg, row.quantity_kg);
        total_quantity += row.quantity_kg;
        subtotal += line;
    }

    policy::check_checkout_limits(user.role, total_quantity, subtotal)
        .map_err(AppError::BadRequest)?;

    // Coupon consumption happens here, inside the transaction, so an
    // abandoned checkout never burns the code.
    let mut discount = Decimal::ZERO;
    let mut coupon_code = None;
    if let Some(raw) = payload.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
        let code = coupon_service::normalize_code(raw).map_err(AppError::BadRequest)?;

        let already_used = UsedCoupons::find()
            .filter(
                Condition::all()
                    .add(UsedCouponCol::UserId.eq(user.user_id))
                    .add(UsedCouponCol::Code.eq(code.clone())),
            )
            .one(&txn)
            .await?;
        if already_used.is_some() {
            return Err(AppError::BadRequest("You've already used this coupon".into()));
        }

        let coupon = Coupons::find()
            .filter(CouponCol::Code.eq(code.clone()))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid coupon code".into()))?;

        discount = coupon_service::compute_discount(&coupon.kind, coupon.value, subtotal)
            .map_err(AppError::BadRequest)?;

        UsedCouponActive {
            user_id: Set(user.user_id),
            code: Set(code.clone()),
            used_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        coupon_code = Some(code);
    }

    let total = pricing::round2(subtotal - discount);
    let now = Utc::now();
    let order_id = Uuid::new_v4();

    let order = OrderActive {
        id: Set(order_id),
        placed_by: Set(user.user_id),
        placed_by_role: Set(user.role.as_str().to_string()),
        status: Set(OrderStatus::Confirmed.as_str().to_string()),
        subtotal: Set(pricing::round2(subtotal)),
        discount: Set(pricing::round2(discount)),
        total: Set(total),
        coupon_code: Set(coupon_code),
        total_quantity_kg: Set(total_quantity),
        ship_name: Set(address.name),
        ship_phone: Set(address.phone),
        ship_pincode: Set(address.pincode),
        ship_state: Set(address.state),
        ship_city: Set(address.city),
        ship_street: Set(address.street),
        accepted_by: Set(None),
        accepted_at: Set(None),
        rejected_by: Set(None),
        rejected_at: Set(None),
        dispatched_at: Set(None),
        delivered_at: Set(None),
        cancelled_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(cart_rows.len());
    for row in &cart_rows {
        let product = Products::find_by_id(row.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest("product no longer available".into()))?;

        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            name: Set(product.name),
            price_per_kg: Set(row.price_per_kg),
            quantity_kg: Set(row.quantity_kg),
            line_total: Set(pricing::line_total(row.price_per_kg, row.quantity_kg)),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        order_items.push(order_item_from_entity(item));
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_confirmed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order confirmed",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::PlacedBy.eq(user.user_id));
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
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Confirmed orders waiting for the caller's tier: retailers see customer
/// orders, wholesalers see retailer orders.
pub async fn pending_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_allowed(user, Resource::Acceptance, Action::Read)?;

    let placer = lifecycle::accepts_orders_from(user.role).ok_or(AppError::Forbidden)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Status.eq(OrderStatus::Confirmed.as_str()))
                .add(OrderCol::PlacedByRole.eq(placer.as_str())),
        )
        .order_by_asc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Orders the caller has accepted, in whatever state they have reached.
pub async fn accepted_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_allowed(user, Resource::Acceptance, Action::Read)?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::AcceptedBy.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
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
    let order = Orders::find()
        .filter(
            Condition::all().add(OrderCol::Id.eq(id)).add(
                Condition::any()
                    .add(OrderCol::PlacedBy.eq(user.user_id))
                    .add(OrderCol::AcceptedBy.eq(user.user_id)),
            ),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// First acceptor wins: the status flip is a conditional update on the
/// Confirmed state, so a concurrent second acceptor loses the race and
/// receives a conflict instead of double-stamping the order.
pub async fn accept_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    ensure_allowed(user, Resource::Acceptance, Action::Write)?;

    let order = find_order(state, id).await?;
    let placed_role = parse_role(&order.placed_by_role)?;
    if lifecycle::acceptor_role(placed_role) != Some(user.role) {
        return Err(AppError::Forbidden);
    }

    let status = parse_status(&order.status)?;
    if !lifecycle::can_transition(status, OrderStatus::Accepted) {
        return Err(AppError::Conflict("Order already accepted".into()));
    }

    let now = Utc::now();
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Accepted.as_str()))
        .col_expr(OrderCol::AcceptedBy, Expr::value(user.user_id))
        .col_expr(OrderCol::AcceptedAt, Expr::value(now))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(OrderStatus::Confirmed.as_str()))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Order already accepted".into()));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_accepted",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await;

    let order = find_order(state, id).await?;
    Ok(ApiResponse::success(
        "Order accepted",
        order_from_entity(order),
        None,
    ))
}

pub async fn reject_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    ensure_allowed(user, Resource::Acceptance, Action::Write)?;

    let order = find_order(state, id).await?;
    let placed_role = parse_role(&order.placed_by_role)?;
    if lifecycle::acceptor_role(placed_role) != Some(user.role) {
        return Err(AppError::Forbidden);
    }

    let status = parse_status(&order.status)?;
    if !lifecycle::can_transition(status, OrderStatus::Rejected) {
        return Err(AppError::Conflict(format!("Order is {status}")));
    }
    // Once accepted, only the acceptor may still reject.
    if status == OrderStatus::Accepted && order.accepted_by != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    let now = Utc::now();
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Rejected.as_str()))
        .col_expr(OrderCol::RejectedBy, Expr::value(user.user_id))
        .col_expr(OrderCol::RejectedAt, Expr::value(now))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(status.as_str()))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Order changed state".into()));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_rejected",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await;

    let order = find_order(state, id).await?;
    Ok(ApiResponse::success(
        "Order rejected",
        order_from_entity(order),
        None,
    ))
}

pub async fn dispatch_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    transition_by_acceptor(
        state,
        user,
        id,
        OrderStatus::Dispatched,
        OrderCol::DispatchedAt,
        "order_dispatched",
        "Order dispatched",
    )
    .await
}

pub async fn deliver_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    transition_by_acceptor(
        state,
        user,
        id,
        OrderStatus::Delivered,
        OrderCol::DeliveredAt,
        "order_delivered",
        "Order delivered",
    )
    .await
}

/// Dispatched/Delivered both follow the same shape: only the recorded
/// acceptor may advance, and the prior status is re-checked in the write.
async fn transition_by_acceptor(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: OrderStatus,
    stamp_col: OrderCol,
    audit_action: &str,
    message: &str,
) -> AppResult<ApiResponse<Order>> {
    ensure_allowed(user, Resource::Acceptance, Action::Write)?;

    let order = find_order(state, id).await?;
    if order.accepted_by != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    let status = parse_status(&order.status)?;
    if !lifecycle::can_transition(status, target) {
        return Err(AppError::Conflict(format!("Order is {status}")));
    }

    let now = Utc::now();
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(target.as_str()))
        .col_expr(stamp_col, Expr::value(now))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(status.as_str()))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Order changed state".into()));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        audit_action,
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await;

    let order = find_order(state, id).await?;
    Ok(ApiResponse::success(message, order_from_entity(order), None))
}

/// Placer-side cancellation, allowed only while the order is Confirmed and
/// the role's window since placement has not elapsed.
pub async fn cancel_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = find_order(state, id).await?;
    if order.placed_by != user.user_id {
        return Err(AppError::Forbidden);
    }

    let status = parse_status(&order.status)?;
    if !lifecycle::can_transition(status, OrderStatus::Cancelled) {
        return Err(AppError::Conflict(format!("Order is {status}")));
    }

    let placed_role = parse_role(&order.placed_by_role)?;
    let placed_at = order.created_at.with_timezone(&Utc);
    let now = Utc::now();
    if !lifecycle::can_cancel(placed_role, placed_at, now) {
        return Err(AppError::BadRequest(
            "Cancellation window has passed".into(),
        ));
    }

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Cancelled.as_str()))
        .col_expr(OrderCol::CancelledAt, Expr::value(now))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(OrderStatus::Confirmed.as_str()))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Order changed state".into()));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancelled",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await;

    let order = find_order(state, id).await?;
    Ok(ApiResponse::success(
        "Order cancelled",
        order_from_entity(order),
        None,
    ))
}

async fn find_order(state: &AppState, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        placed_by: model.placed_by,
        placed_by_role: model.placed_by_role,
        status: model.status,
        subtotal: model.subtotal,
        discount: model.discount,
        total: model.total,
        coupon_code: model.coupon_code,
        total_quantity_kg: model.total_quantity_kg,
        ship_name: model.ship_name,
        ship_phone: model.ship_phone,
        ship_pincode: model.ship_pincode,
        ship_state: model.ship_state,
        ship_city: model.ship_city,
        ship_street: model.ship_street,
        accepted_by: model.accepted_by,
        accepted_at: model.accepted_at.map(|dt| dt.with_timezone(&Utc)),
        rejected_by: model.rejected_by,
        rejected_at: model.rejected_at.map(|dt| dt.with_timezone(&Utc)),
        dispatched_at: model.dispatched_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        price_per_kg: model.price_per_kg,
        quantity_kg: model.quantity_kg,
        line_total: model.line_total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
