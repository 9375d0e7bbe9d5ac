use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::reviews::{ReviewList, SubmitReviewRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    routes::params::ReviewListQuery,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_reviews).post(submit_review))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("rating" = Option<i16>, Query, description = "Filter by star rating"),
        ("role" = Option<String>, Query, description = "Filter by submitter role")
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<ReviewList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Submit a review", body = ApiResponse<Review>),
        (status = 400, description = "Rating outside 1-5 or empty comment"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubmitReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::submit_review(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}
