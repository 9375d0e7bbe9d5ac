use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::UserList,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
        coupons::{AppliedCoupon, CouponList, CreateCouponRequest, ValidateCouponRequest},
        inventory::{OverrideList, OverrideView, UpsertOverrideRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        products::{
            CreateProductRequest, PackageQuote, ProductQuote, ProductQuoteList,
            UpdateProductRequest,
        },
        profile::{AddAddressRequest, AddressList},
        reviews::{ReviewList, SubmitReviewRequest},
        support::{MessageList, PostMessageRequest, QueryList, SubmitQueryRequest},
    },
    models::{
        Address, CartItem, Coupon, Order, OrderItem, PriceOverride, Product, Review,
        SupportMessage, SupportQuery, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, coupons, health, inventory, orders, params, products, profile,
        reviews, support,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::featured_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        coupons::validate_coupon,
        inventory::list_overrides,
        inventory::upsert_override,
        inventory::delete_override,
        profile::me,
        profile::list_addresses,
        profile::add_address,
        profile::delete_address,
        orders::checkout,
        orders::list_orders,
        orders::pending_orders,
        orders::accepted_orders,
        orders::get_order,
        orders::accept_order,
        orders::reject_order,
        orders::dispatch_order,
        orders::deliver_order,
        orders::cancel_order,
        reviews::list_reviews,
        reviews::submit_review,
        support::submit_query,
        support::list_queries,
        support::get_messages,
        support::post_message,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::list_users,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_coupons,
        admin::create_coupon,
        admin::delete_coupon,
        admin::delete_review,
        admin::list_queries,
        admin::get_query_messages,
        admin::post_query_message
    ),
    components(
        schemas(
            User,
            Product,
            PriceOverride,
            Address,
            CartItem,
            Coupon,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ProductQuote,
            ProductQuoteList,
            PackageQuote,
            CreateProductRequest,
            UpdateProductRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            ValidateCouponRequest,
            AppliedCoupon,
            CreateCouponRequest,
            CouponList,
            UpsertOverrideRequest,
            OverrideView,
            OverrideList,
            AddAddressRequest,
            AddressList,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            UserList,
            Review,
            SubmitReviewRequest,
            ReviewList,
            SupportQuery,
            SupportMessage,
            SubmitQueryRequest,
            PostMessageRequest,
            QueryList,
            MessageList,
            params::Pagination,
            params::ProductQuery,
            params::ReviewListQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<ProductQuote>,
            ApiResponse<ProductQuoteList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Role-priced catalog"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Coupons", description = "Coupon preview"),
        (name = "Inventory", description = "Seller price and stock entries"),
        (name = "Profile", description = "Profile and delivery addresses"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Reviews", description = "Marketplace reviews"),
        (name = "Support", description = "Help queries and reply threads"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
