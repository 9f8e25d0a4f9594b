use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, Rating};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateProductRequest {
    pub product_code: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateProductRequest {
    pub product_code: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRatingSummary {
    pub product_id: i32,
    pub product_name: String,
    pub total_ratings: u64,
    pub average_rating: f64,
    pub ratings: Vec<Rating>,
}
