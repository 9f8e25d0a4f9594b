use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{BuyerSummary, Order, Product, Rating};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateRatingRequest {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub buyer_id: Option<i64>,
    /// Between 1 and 5 inclusive.
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateRatingRequest {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub buyer_id: Option<i64>,
    pub rating: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub order: Option<Order>,
    pub product: Option<Product>,
    pub buyer: Option<BuyerSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRatings {
    pub product_id: i32,
    pub average_rating: f64,
    pub total_ratings: u64,
    pub ratings: Vec<RatingView>,
}
