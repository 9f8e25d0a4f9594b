use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DetailOrder, Order, Product};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateDetailOrderRequest {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateDetailOrderRequest {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DetailOrderView {
    #[serde(flatten)]
    pub detail: DetailOrder,
    pub order: Option<Order>,
    pub product: Option<Product>,
}
