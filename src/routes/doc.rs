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
    models::Role,
    response::Pagination,
    routes::{auth, books, buyers, detail_orders, health, orders, products, ratings, users, vouchers},
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
        auth::register_buyer,
        auth::login_buyer,
        auth::profile,
        auth::update_profile,
        auth::change_password,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        buyers::list_buyers,
        buyers::get_buyer,
        buyers::create_buyer,
        buyers::update_buyer,
        buyers::delete_buyer,
        products::list_products,
        products::get_product,
        products::get_product_by_code,
        products::product_rating,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::get_order,
        orders::get_order_by_code,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        detail_orders::list_detail_orders,
        detail_orders::get_detail_order,
        detail_orders::create_detail_order,
        detail_orders::update_detail_order,
        detail_orders::delete_detail_order,
        ratings::list_ratings,
        ratings::list_product_ratings,
        ratings::get_rating,
        ratings::create_rating,
        ratings::update_rating,
        ratings::delete_rating,
        vouchers::list_vouchers,
        vouchers::get_voucher_by_code,
        vouchers::get_voucher,
        vouchers::create_voucher,
        vouchers::update_voucher,
        vouchers::use_voucher,
        vouchers::delete_voucher,
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book
    ),
    components(schemas(Role, Pagination)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "User and buyer authentication"),
        (name = "Users", description = "User accounts"),
        (name = "Buyers", description = "Buyer accounts"),
        (name = "Products", description = "Product catalogue"),
        (name = "Orders", description = "Orders and their lines"),
        (name = "Detail Orders", description = "Order lines"),
        (name = "Ratings", description = "Product ratings"),
        (name = "Vouchers", description = "Discount vouchers"),
        (name = "Books", description = "Book catalogue"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
