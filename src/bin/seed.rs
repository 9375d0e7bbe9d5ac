use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use freshmarket_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "admin@freshmarket.test", "admin123", "Admin", "admin").await?;
    ensure_user(&pool, "customer@freshmarket.test", "customer123", "Demo Customer", "customer")
        .await?;
    let retailer_id =
        ensure_user(&pool, "retailer@freshmarket.test", "retailer123", "Demo Retailer", "retailer")
            .await?;
    let wholesaler_id = ensure_user(
        &pool,
        "wholesaler@freshmarket.test",
        "wholesaler123",
        "Demo Wholesaler",
        "wholesaler",
    )
    .await?;

    let product_ids = seed_products(&pool).await?;
    seed_overrides(&pool, retailer_id, "retailer", &product_ids, dec!(1.25)).await?;
    seed_overrides(&pool, wholesaler_id, "wholesaler", &product_ids, dec!(1.0)).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<Vec<(Uuid, Decimal)>> {
    let products = vec![
        ("Tomato", "vegetables", dec!(30)),
        ("Onion", "vegetables", dec!(25)),
        ("Potato", "vegetables", dec!(20)),
        ("Spinach", "vegetables", dec!(40)),
        ("Carrot", "vegetables", dec!(35)),
        ("Apple", "fruits", dec!(120)),
        ("Banana", "fruits", dec!(45)),
        ("Mango", "fruits", dec!(90)),
    ];

    let mut seeded = Vec::with_capacity(products.len());
    for (name, category, base_price) in products {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, category)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET category = EXCLUDED.category
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(category)
        .fetch_one(pool)
        .await?;
        seeded.push((row.0, base_price));
    }

    println!("Seeded products");
    Ok(seeded)
}

async fn seed_overrides(
    pool: &sqlx::PgPool,
    seller_id: Uuid,
    seller_role: &str,
    products: &[(Uuid, Decimal)],
    markup: Decimal,
) -> anyhow::Result<()> {
    for (product_id, base_price) in products {
        sqlx::query(
            r#"
            INSERT INTO price_overrides (id, seller_id, product_id, seller_role, price_per_kg, stock_kg)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (seller_id, product_id)
            DO UPDATE SET price_per_kg = EXCLUDED.price_per_kg, stock_kg = EXCLUDED.stock_kg
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(product_id)
        .bind(seller_role)
        .bind(base_price * markup)
        .bind(dec!(500))
        .execute(pool)
        .await?;
    }

    println!("Seeded {seller_role} overrides");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let coupons = vec![
        ("FLAT50", "flat", dec!(50), "Flat ₹50 off your order"),
        ("SAVE10", "percentage", dec!(10), "10% off your order"),
        ("WELCOME20", "percentage", dec!(20), "20% off for new shoppers"),
    ];

    for (code, kind, value, description) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, kind, value, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(kind)
        .bind(value)
        .bind(description)
        .execute(pool)
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}
