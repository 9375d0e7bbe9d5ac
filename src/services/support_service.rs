use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::support::{MessageList, PostMessageRequest, QueryList, SubmitQueryRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_allowed},
    models::{SupportMessage, SupportQuery},
    policy::{Action, Resource, Role},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

const ALL_SUBJECTS: &[&str] = &[
    "orders",
    "account",
    "cart",
    "checkout",
    "payment",
    "shop",
    "inventory",
    "myproducts",
];

/// Help-form subjects offered per role. Customers never see seller
/// subjects; wholesalers never see buyer ones.
pub fn allowed_subjects(role: Role) -> Vec<&'static str> {
    ALL_SUBJECTS
        .iter()
        .copied()
        .filter(|subject| match role {
            Role::Customer => !matches!(*subject, "inventory" | "myproducts"),
            Role::Wholesaler => !matches!(*subject, "cart" | "shop" | "checkout"),
            _ => true,
        })
        .collect()
}

pub async fn submit_query(
    pool: &DbPool,
    user: &AuthUser,
    payload: SubmitQueryRequest,
) -> AppResult<ApiResponse<SupportQuery>> {
    ensure_allowed(user, Resource::Support, Action::Write)?;

    if !allowed_subjects(user.role).contains(&payload.subject.as_str()) {
        return Err(AppError::BadRequest(format!(
            "subject {} is not available for your role",
            payload.subject
        )));
    }
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("query cannot be empty".into()));
    }

    let submitter: (String, String) = sqlx::query_as("SELECT name, email FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let query: SupportQuery = sqlx::query_as(
        r#"
        INSERT INTO support_queries (id, user_id, name, role, email, subject, body)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(submitter.0)
    .bind(user.role.as_str())
    .bind(submitter.1)
    .bind(payload.subject)
    .bind(body)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "query_submit",
        Some("support_queries"),
        Some(serde_json::json!({ "query_id": query.id, "subject": query.subject })),
    )
    .await;

    Ok(ApiResponse::success("Query submitted", query, None))
}

pub async fn my_queries(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<QueryList>> {
    ensure_allowed(user, Resource::Support, Action::Read)?;

    let items: Vec<SupportQuery> = sqlx::query_as(
        "SELECT * FROM support_queries WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        QueryList { items },
        Some(Meta::empty()),
    ))
}

async fn owned_query(pool: &DbPool, user: &AuthUser, query_id: Uuid) -> AppResult<SupportQuery> {
    let query: Option<SupportQuery> =
        sqlx::query_as("SELECT * FROM support_queries WHERE id = $1 AND user_id = $2")
            .bind(query_id)
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;
    query.ok_or(AppError::NotFound)
}

/// Thread for the query's owner. Opening it marks the admin side's
/// messages read, then returns the full thread oldest first.
pub async fn get_messages(
    pool: &DbPool,
    user: &AuthUser,
    query_id: Uuid,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_allowed(user, Resource::Support, Action::Read)?;
    owned_query(pool, user, query_id).await?;

    sqlx::query(
        "UPDATE support_messages SET read = TRUE WHERE query_id = $1 AND sender = 'admin' AND NOT read",
    )
    .bind(query_id)
    .execute(pool)
    .await?;

    let items = thread(pool, query_id).await?;
    Ok(ApiResponse::success(
        "OK",
        MessageList { items },
        Some(Meta::empty()),
    ))
}

pub async fn post_message(
    pool: &DbPool,
    user: &AuthUser,
    query_id: Uuid,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<SupportMessage>> {
    ensure_allowed(user, Resource::Support, Action::Write)?;
    owned_query(pool, user, query_id).await?;
    insert_message(pool, query_id, "user", &payload.body).await
}

pub async fn admin_list_queries(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<QueryList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = pagination.normalize();

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM support_queries")
        .fetch_one(pool)
        .await?;

    let items: Vec<SupportQuery> = sqlx::query_as(
        "SELECT * FROM support_queries ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", QueryList { items }, Some(meta)))
}

/// Admin view of a thread; opening it marks the user side's messages read.
pub async fn admin_get_messages(
    pool: &DbPool,
    user: &AuthUser,
    query_id: Uuid,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_admin(user)?;
    query_exists(pool, query_id).await?;

    sqlx::query(
        "UPDATE support_messages SET read = TRUE WHERE query_id = $1 AND sender = 'user' AND NOT read",
    )
    .bind(query_id)
    .execute(pool)
    .await?;

    let items = thread(pool, query_id).await?;
    Ok(ApiResponse::success(
        "OK",
        MessageList { items },
        Some(Meta::empty()),
    ))
}

pub async fn admin_post_message(
    pool: &DbPool,
    user: &AuthUser,
    query_id: Uuid,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<SupportMessage>> {
    ensure_admin(user)?;
    query_exists(pool, query_id).await?;
    insert_message(pool, query_id, "admin", &payload.body).await
}

async fn query_exists(pool: &DbPool, query_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM support_queries WHERE id = $1")
        .bind(query_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn thread(pool: &DbPool, query_id: Uuid) -> AppResult<Vec<SupportMessage>> {
    let items: Vec<SupportMessage> = sqlx::query_as(
        "SELECT * FROM support_messages WHERE query_id = $1 ORDER BY created_at",
    )
    .bind(query_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

async fn insert_message(
    pool: &DbPool,
    query_id: Uuid,
    sender: &str,
    body: &str,
) -> AppResult<ApiResponse<SupportMessage>> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".into()));
    }

    let message: SupportMessage = sqlx::query_as(
        r#"
        INSERT INTO support_messages (id, query_id, sender, body)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(query_id)
    .bind(sender)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Message sent", message, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customers_see_buyer_subjects_only() {
        let subjects = allowed_subjects(Role::Customer);
        assert!(subjects.contains(&"cart"));
        assert!(subjects.contains(&"checkout"));
        assert!(!subjects.contains(&"inventory"));
        assert!(!subjects.contains(&"myproducts"));
    }

    #[test]
    fn wholesalers_see_seller_subjects_only() {
        let subjects = allowed_subjects(Role::Wholesaler);
        assert!(subjects.contains(&"inventory"));
        assert!(subjects.contains(&"orders"));
        assert!(!subjects.contains(&"cart"));
        assert!(!subjects.contains(&"shop"));
        assert!(!subjects.contains(&"checkout"));
    }

    #[test]
    fn retailers_see_every_subject() {
        assert_eq!(allowed_subjects(Role::Retailer).len(), ALL_SUBJECTS.len());
    }
}
