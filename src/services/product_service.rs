use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{PackageQuote, ProductQuote, ProductQuoteList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_allowed},
    policy::{Action, Resource, supplier_tier},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
};

#[derive(FromRow)]
struct QuoteRow {
    id: Uuid,
    name: String,
    category: String,
    image_url: Option<String>,
    base_price_per_kg: Decimal,
}

const QUOTE_SELECT: &str = r#"
    SELECT p.id, p.name, p.category, p.image_url,
           COALESCE(AVG(o.price_per_kg), 0) AS base_price_per_kg
    FROM products p
    LEFT JOIN price_overrides o
           ON o.product_id = p.id AND o.seller_role = $1
"#;

fn quote_from_row(row: QuoteRow, user: &AuthUser) -> ProductQuote {
    let today = Utc::now().date_naive();
    let discount_percent = pricing::daily_discount_percent(user.user_id, user.role, today);
    let unit = pricing::unit_price(row.base_price_per_kg, discount_percent);
    let packages = pricing::package_menu(user.role)
        .into_iter()
        .map(|option| PackageQuote {
            price: pricing::line_total(unit, option.quantity_kg),
            label: option.label,
            quantity_kg: option.quantity_kg,
        })
        .collect();

    ProductQuote {
        id: row.id,
        name: row.name,
        category: row.category,
        image_url: row.image_url,
        base_price_per_kg: row.base_price_per_kg,
        discount_percent,
        unit_price_per_kg: unit,
        packages,
    }
}

pub async fn list_products(
    pool: &DbPool,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductQuoteList>> {
    ensure_allowed(user, Resource::Shop, Action::Read)?;

    let (page, limit, offset) = query.pagination.normalize();
    let tier = supplier_tier(user.role);

    let sql = format!(
        r#"{QUOTE_SELECT}
        WHERE ($2::text IS NULL OR p.category = $2)
          AND ($3::text IS NULL OR p.name ILIKE '%' || $3 || '%')
        GROUP BY p.id, p.name, p.category, p.image_url
        ORDER BY p.name
        LIMIT $4 OFFSET $5
        "#
    );

    let rows: Vec<QuoteRow> = sqlx::query_as(&sql)
        .bind(tier.as_str())
        .bind(query.category.as_deref())
        .bind(query.q.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM products p
        WHERE ($1::text IS NULL OR p.category = $1)
          AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(query.category.as_deref())
    .bind(query.q.as_deref())
    .fetch_one(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| quote_from_row(row, user))
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        ProductQuoteList { items },
        Some(meta),
    ))
}

pub async fn get_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductQuote>> {
    ensure_allowed(user, Resource::Shop, Action::Read)?;

    let tier = supplier_tier(user.role);
    let sql = format!(
        r#"{QUOTE_SELECT}
        WHERE p.id = $2
        GROUP BY p.id, p.name, p.category, p.image_url
        "#
    );

    let row: Option<QuoteRow> = sqlx::query_as(&sql)
        .bind(tier.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Product",
        quote_from_row(row, user),
        None,
    ))
}

/// The four mid-priced products of the day, shown on the storefront home
/// page with the viewer's daily discount applied.
pub async fn featured_products(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductQuoteList>> {
    ensure_allowed(user, Resource::Shop, Action::Read)?;

    let tier = supplier_tier(user.role);
    let sql = format!(
        r#"{QUOTE_SELECT}
        GROUP BY p.id, p.name, p.category, p.image_url
        ORDER BY base_price_per_kg ASC
        "#
    );

    let rows: Vec<QuoteRow> = sqlx::query_as(&sql)
        .bind(tier.as_str())
        .fetch_all(pool)
        .await?;

    // Mid-range picks, skipping the cheapest and priciest ends.
    let start = (rows.len() / 2).saturating_sub(2);
    let items = rows
        .into_iter()
        .skip(start)
        .take(4)
        .map(|row| quote_from_row(row, user))
        .collect();

    Ok(ApiResponse::success(
        "Featured",
        ProductQuoteList { items },
        Some(Meta::empty()),
    ))
}
