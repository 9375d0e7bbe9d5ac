use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::support::{MessageList, PostMessageRequest, QueryList, SubmitQueryRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{SupportMessage, SupportQuery},
    response::ApiResponse,
    services::support_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queries", get(list_queries).post(submit_query))
        .route("/queries/{id}/messages", get(get_messages).post(post_message))
}

#[utoipa::path(
    post,
    path = "/api/support/queries",
    request_body = SubmitQueryRequest,
    responses(
        (status = 200, description = "Open a help query", body = ApiResponse<SupportQuery>),
        (status = 400, description = "Subject not offered to the caller's role"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn submit_query(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubmitQueryRequest>,
) -> AppResult<Json<ApiResponse<SupportQuery>>> {
    let resp = support_service::submit_query(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/support/queries",
    responses(
        (status = 200, description = "The caller's help queries", body = ApiResponse<QueryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn list_queries(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<QueryList>>> {
    let resp = support_service::my_queries(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/support/queries/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Query ID")
    ),
    responses(
        (status = 200, description = "Thread, oldest first; admin replies are marked read", body = ApiResponse<MessageList>),
        (status = 404, description = "Not the caller's query"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn get_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = support_service::get_messages(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/support/queries/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Query ID")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Append to the caller's thread", body = ApiResponse<SupportMessage>),
        (status = 404, description = "Not the caller's query"),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> AppResult<Json<ApiResponse<SupportMessage>>> {
    let resp = support_service::post_message(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}
