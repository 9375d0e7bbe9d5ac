use uuid::Uuid;

use freshmarket_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        reviews::SubmitReviewRequest,
        support::{PostMessageRequest, SubmitQueryRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    policy::Role,
    routes::params::{Pagination, ReviewListQuery},
    services::{review_service, support_service},
    state::AppState,
};

#[tokio::test]
async fn reviews_flow_submit_filter_and_moderate() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer).await?;
    let admin = create_user(&state, Role::Admin).await?;

    let submitted = review_service::submit_review(
        &state.pool,
        &customer,
        SubmitReviewRequest {
            rating: 5,
            comment: "Crisp greens, quick delivery.".into(),
            image_urls: None,
        },
    )
    .await?;
    let review = submitted.data.expect("review");
    assert_eq!(review.rating, 5);
    assert_eq!(review.user_role, "customer");

    // Ratings live on a 1-5 scale.
    let too_high = review_service::submit_review(
        &state.pool,
        &customer,
        SubmitReviewRequest {
            rating: 6,
            comment: "off the scale".into(),
            image_urls: None,
        },
    )
    .await;
    assert!(matches!(too_high, Err(AppError::BadRequest(_))));

    // Admins moderate; they do not submit through the storefront form.
    let admin_submit = review_service::submit_review(
        &state.pool,
        &admin,
        SubmitReviewRequest {
            rating: 4,
            comment: "testing".into(),
            image_urls: None,
        },
    )
    .await;
    assert!(matches!(admin_submit, Err(AppError::Forbidden)));

    let listed = review_service::list_reviews(
        &state.pool,
        &customer,
        ReviewListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            rating: Some(5),
            role: Some("customer".into()),
        },
    )
    .await?;
    let listed = listed.data.expect("review list");
    assert!(listed.items.iter().any(|r| r.id == review.id));
    assert!(listed.items.iter().all(|r| r.rating == 5));

    review_service::delete_review(&state.pool, &admin, review.id).await?;
    let again = review_service::delete_review(&state.pool, &admin, review.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn support_thread_carries_replies_and_read_marks() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer).await?;
    let admin = create_user(&state, Role::Admin).await?;

    // Seller-side subjects are not offered to customers.
    let wrong_subject = support_service::submit_query(
        &state.pool,
        &customer,
        SubmitQueryRequest {
            subject: "inventory".into(),
            body: "where do I list stock?".into(),
        },
    )
    .await;
    assert!(matches!(wrong_subject, Err(AppError::BadRequest(_))));

    let opened = support_service::submit_query(
        &state.pool,
        &customer,
        SubmitQueryRequest {
            subject: "orders".into(),
            body: "My order shows confirmed but has not moved.".into(),
        },
    )
    .await?;
    let query = opened.data.expect("query");
    assert_eq!(query.subject, "orders");

    support_service::post_message(
        &state.pool,
        &customer,
        query.id,
        PostMessageRequest {
            body: "Any update?".into(),
        },
    )
    .await?;

    // Opening the admin view marks the user's messages read.
    let admin_view = support_service::admin_get_messages(&state.pool, &admin, query.id).await?;
    let admin_view = admin_view.data.expect("thread");
    assert_eq!(admin_view.items.len(), 1);
    assert!(admin_view.items.iter().all(|m| m.read));

    support_service::admin_post_message(
        &state.pool,
        &admin,
        query.id,
        PostMessageRequest {
            body: "A retailer accepted it this morning.".into(),
        },
    )
    .await?;

    // The owner's view marks the admin reply read in turn.
    let user_view = support_service::get_messages(&state.pool, &customer, query.id).await?;
    let user_view = user_view.data.expect("thread");
    assert_eq!(user_view.items.len(), 2);
    assert!(user_view.items.iter().all(|m| m.read));

    // Threads are private to their owner.
    let stranger = create_user(&state, Role::Customer).await?;
    let not_yours = support_service::get_messages(&state.pool, &stranger, query.id).await;
    assert!(matches!(not_yours, Err(AppError::NotFound)));

    let all = support_service::admin_list_queries(
        &state.pool,
        &admin,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?;
    assert!(all.data.expect("queries").items.iter().any(|q| q.id == query.id));

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
