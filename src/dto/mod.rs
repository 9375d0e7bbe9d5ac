pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod support;
