use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod support;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/coupons", coupons::router())
        .nest("/inventory", inventory::router())
        .nest("/profile", profile::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
        .nest("/support", support::router())
        .nest("/admin", admin::router())
}
