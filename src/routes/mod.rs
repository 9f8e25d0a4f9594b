use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod books;
pub mod buyers;
pub mod detail_orders;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod ratings;
pub mod users;
pub mod vouchers;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users-new", users::router())
        .nest("/buyers", buyers::router())
        .nest("/products", products::router())
        .nest("/orders", orders::route())
        .nest("/detail-orders", detail_orders::router())
        .nest("/ratings", ratings::router())
        .nest("/vouchers", vouchers::router())
        .nest("/book", books::router())
}
