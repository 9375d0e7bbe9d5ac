use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::reviews::{ReviewList, SubmitReviewRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_allowed},
    models::Review,
    policy::{Action, Resource},
    response::{ApiResponse, Meta},
    routes::params::ReviewListQuery,
};

pub fn validate_rating(rating: i16) -> Result<(), String> {
    if !(1..=5).contains(&rating) {
        return Err("rating must be between 1 and 5".to_string());
    }
    Ok(())
}

pub async fn submit_review(
    pool: &DbPool,
    user: &AuthUser,
    payload: SubmitReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_allowed(user, Resource::Reviews, Action::Write)?;

    validate_rating(payload.rating).map_err(AppError::BadRequest)?;
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("comment cannot be empty".into()));
    }

    let submitter: (String,) = sqlx::query_as("SELECT name FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let review: Review = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, user_id, user_name, user_role, rating, comment, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(submitter.0)
    .bind(user.role.as_str())
    .bind(payload.rating)
    .bind(comment)
    .bind(payload.image_urls.unwrap_or_default())
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "review_submit",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "rating": review.rating })),
    )
    .await;

    Ok(ApiResponse::success("Review submitted", review, None))
}

/// Newest first, optionally narrowed to one star rating or submitter role.
pub async fn list_reviews(
    pool: &DbPool,
    user: &AuthUser,
    query: ReviewListQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_allowed(user, Resource::Reviews, Action::Read)?;

    let (page, limit, offset) = query.pagination.normalize();

    let items: Vec<Review> = sqlx::query_as(
        r#"
        SELECT * FROM reviews
        WHERE ($1::smallint IS NULL OR rating = $1)
          AND ($2::text IS NULL OR user_role = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.rating)
    .bind(query.role.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM reviews
        WHERE ($1::smallint IS NULL OR rating = $1)
          AND ($2::text IS NULL OR user_role = $2)
        "#,
    )
    .bind(query.rating)
    .bind(query.role.as_deref())
    .fetch_one(pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", ReviewList { items }, Some(meta)))
}

pub async fn delete_review(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "review_delete",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_one_to_five() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
        for stars in 1..=5 {
            assert!(validate_rating(stars).is_ok());
        }
    }
}
