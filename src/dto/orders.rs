use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::nullable;
use crate::models::{BuyerSummary, DetailOrder, Order, Product, Rating, UserSummary};

#[derive(Debug, Deserialize, Default, Clone, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Option<i32>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateOrderRequest {
    pub order_code: Option<String>,
    pub total: Option<f64>,
    pub detail_orders: Option<Vec<OrderLineRequest>>,
    pub user_id: Option<i32>,
    pub buyer_id: Option<i64>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub discount: Option<f64>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateOrderRequest {
    pub order_code: Option<String>,
    /// `null` detaches the order from its user.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>, nullable)]
    pub user_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>, nullable)]
    pub buyer_id: Option<Option<i64>>,
    pub total: Option<f64>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub discount: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DetailOrderWithProduct {
    #[serde(flatten)]
    pub detail: DetailOrder,
    pub product: Option<Product>,
}

/// An order with everything hanging off it.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<UserSummary>,
    pub buyer: Option<BuyerSummary>,
    pub detail_orders: Vec<DetailOrderWithProduct>,
    pub ratings: Vec<Rating>,
}
