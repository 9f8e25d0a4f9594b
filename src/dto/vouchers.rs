use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{BuyerSummary, Voucher};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateVoucherRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub expired_time: Option<DateTime<Utc>>,
    pub quantity_max: Option<i32>,
    pub buyer_id: Option<i64>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateVoucherRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub expired_time: Option<DateTime<Utc>>,
    pub quantity_used: Option<i32>,
    pub quantity_max: Option<i32>,
    pub buyer_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherView {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub buyer: Option<BuyerSummary>,
}
