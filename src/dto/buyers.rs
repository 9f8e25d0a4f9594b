use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Buyer, Order, Rating, Voucher};

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct CreateBuyerRequest {
    pub phone: Option<String>,
    pub username: Option<String>,
    pub activation_code: Option<String>,
    pub expired: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateBuyerRequest {
    pub phone: Option<String>,
    pub username: Option<String>,
    pub activation_code: Option<String>,
    pub expired: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuyerDetail {
    #[serde(flatten)]
    pub buyer: Buyer,
    pub vouchers: Vec<Voucher>,
    pub orders: Vec<Order>,
    pub ratings: Vec<Rating>,
}
