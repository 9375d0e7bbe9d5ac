use rust_decimal_macros::dec;
use uuid::Uuid;

use freshmarket_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::CheckoutRequest,
        profile::AddAddressRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    policy::Role,
    services::{cart_service, order_service, profile_service},
    state::AppState,
};

// Full flow: customer fills a cart, checks out with a flat coupon, a
// retailer accepts first (a second retailer loses the race), dispatches
// and delivers. A separate order exercises the cancel window.
#[tokio::test]
async fn customer_order_runs_the_full_lifecycle() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer).await?;
    let retailer = create_user(&state, Role::Retailer).await?;
    let rival_retailer = create_user(&state, Role::Retailer).await?;

    let product_id = create_product(&state).await?;
    create_override(&state, retailer.user_id, product_id, dec!(100)).await?;

    let address_id = create_address(&state, &customer).await?;
    let coupon_code = create_flat_coupon(&state, dec!(50)).await?;

    // 2kg at >= 80/kg clears the ₹99 floor even at the 20% display discount.
    cart_service::add_to_cart(
        &state.pool,
        &customer,
        AddToCartRequest {
            product_id,
            quantity_kg: dec!(2),
        },
    )
    .await?;

    let checkout = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id,
            coupon_code: Some(coupon_code.clone()),
        },
    )
    .await?;
    let placed = checkout.data.expect("order data");
    let order = placed.order;

    assert_eq!(order.status, "Confirmed");
    assert_eq!(order.coupon_code.as_deref(), Some(coupon_code.as_str()));
    assert_eq!(order.discount, dec!(50.00));
    assert_eq!(order.total, order.subtotal - order.discount);
    assert_eq!(order.total_quantity_kg, dec!(2.00));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].name, "Integration Tomato");

    // The checkout cleared the cart inside the same transaction.
    let cart = cart_service::list_cart(&state.pool, &customer).await?;
    assert!(cart.data.expect("cart view").items.is_empty());

    // Reusing the consumed coupon on a fresh checkout must fail.
    cart_service::add_to_cart(
        &state.pool,
        &customer,
        AddToCartRequest {
            product_id,
            quantity_kg: dec!(2),
        },
    )
    .await?;
    let reuse = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id,
            coupon_code: Some(coupon_code),
        },
    )
    .await;
    assert!(matches!(reuse, Err(AppError::BadRequest(_))));

    // First acceptor wins.
    let accepted = order_service::accept_order(&state, &retailer, order.id).await?;
    assert_eq!(accepted.data.expect("order").status, "Accepted");

    let second = order_service::accept_order(&state, &rival_retailer, order.id).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    // Only the acceptor may advance the order.
    let outsider = order_service::dispatch_order(&state, &rival_retailer, order.id).await;
    assert!(matches!(outsider, Err(AppError::Forbidden)));

    let dispatched = order_service::dispatch_order(&state, &retailer, order.id).await?;
    assert_eq!(dispatched.data.expect("order").status, "Dispatched");

    let delivered = order_service::deliver_order(&state, &retailer, order.id).await?;
    let delivered = delivered.data.expect("order");
    assert_eq!(delivered.status, "Delivered");
    assert!(delivered.delivered_at.is_some());

    Ok(())
}

#[tokio::test]
async fn customer_can_cancel_inside_the_window() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer).await?;
    let retailer = create_user(&state, Role::Retailer).await?;
    let product_id = create_product(&state).await?;
    create_override(&state, retailer.user_id, product_id, dec!(100)).await?;
    let address_id = create_address(&state, &customer).await?;

    cart_service::add_to_cart(
        &state.pool,
        &customer,
        AddToCartRequest {
            product_id,
            quantity_kg: dec!(3),
        },
    )
    .await?;

    let checkout = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id,
            coupon_code: None,
        },
    )
    .await?;
    let order = checkout.data.expect("order data").order;

    // Cancelled seconds after placement, well inside the one-minute window.
    let cancelled = order_service::cancel_order(&state, &customer, order.id).await?;
    let cancelled = cancelled.data.expect("order");
    assert_eq!(cancelled.status, "Cancelled");
    assert!(cancelled.cancelled_at.is_some());

    // A cancelled order cannot be accepted anymore.
    let late = order_service::accept_order(&state, &retailer, order.id).await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn sub_minimum_update_leaves_the_cart_line_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer).await?;
    let retailer = create_user(&state, Role::Retailer).await?;
    let product_id = create_product(&state).await?;
    create_override(&state, retailer.user_id, product_id, dec!(100)).await?;

    cart_service::add_to_cart(
        &state.pool,
        &customer,
        AddToCartRequest {
            product_id,
            quantity_kg: dec!(2),
        },
    )
    .await?;

    let before = cart_service::list_cart(&state.pool, &customer).await?;
    let before = before.data.expect("cart view");
    let line = before
        .items
        .iter()
        .find(|item| item.product_id == product_id)
        .expect("seeded line");
    let original_quantity = line.quantity_kg;
    let original_line_total = line.line_total;

    // 0.05kg is below the customer minimum of 0.1kg.
    let result = cart_service::update_quantity(
        &state.pool,
        &customer,
        product_id,
        UpdateCartItemRequest {
            quantity_kg: dec!(0.05),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let after = cart_service::list_cart(&state.pool, &customer).await?;
    let after = after.data.expect("cart view");
    let line = after
        .items
        .iter()
        .find(|item| item.product_id == product_id)
        .expect("line still present");
    assert_eq!(line.quantity_kg, original_quantity);
    assert_eq!(line.line_total, original_line_total);

    Ok(())
}

#[tokio::test]
async fn wholesalers_cannot_hold_a_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let wholesaler = create_user(&state, Role::Wholesaler).await?;
    let product_id = create_product(&state).await?;

    let result = cart_service::add_to_cart(
        &state.pool,
        &wholesaler,
        AddToCartRequest {
            product_id,
            quantity_kg: dec!(10),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    Ok(())
}

// Allow skipping when no DB is configured in the environment.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: "integration-test-secret".into(),
    };

    Ok(Some(AppState { pool, orm, config }))
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, role) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(format!("{role}-{user_id}@test.local"))
    .bind(format!("Test {role}"))
    .bind("not-a-real-hash")
    .bind(role.as_str())
    .execute(&state.pool)
    .await?;

    Ok(AuthUser { user_id, role })
}

async fn create_product(state: &AppState) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, category)
        VALUES ($1, $2, 'vegetables')
        ON CONFLICT (name) DO UPDATE SET category = EXCLUDED.category
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Integration Tomato")
    .fetch_one(&state.pool)
    .await?;
    Ok(row.0)
}

async fn create_override(
    state: &AppState,
    seller_id: Uuid,
    product_id: Uuid,
    price: rust_decimal::Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO price_overrides (id, seller_id, product_id, seller_role, price_per_kg, stock_kg)
        VALUES ($1, $2, $3, 'retailer', $4, 500)
        ON CONFLICT (seller_id, product_id)
        DO UPDATE SET price_per_kg = EXCLUDED.price_per_kg
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(seller_id)
    .bind(product_id)
    .bind(price)
    .execute(&state.pool)
    .await?;
    Ok(())
}

async fn create_address(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let resp = profile_service::add_address(
        &state.pool,
        user,
        AddAddressRequest {
            name: "Test Recipient".into(),
            phone: "9876543210".into(),
            pincode: "560001".into(),
            state: "Karnataka".into(),
            city: "Bengaluru".into(),
            street: "1 Integration Lane".into(),
        },
    )
    .await?;
    Ok(resp.data.expect("address").id)
}

async fn create_flat_coupon(
    state: &AppState,
    value: rust_decimal::Decimal,
) -> anyhow::Result<String> {
    let code = format!("TESTFLAT{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase());
    sqlx::query("INSERT INTO coupons (id, code, kind, value, description) VALUES ($1, $2, 'flat', $3, 'test coupon')")
        .bind(Uuid::new_v4())
        .bind(&code)
        .bind(value)
        .execute(&state.pool)
        .await?;
    Ok(code)
}
