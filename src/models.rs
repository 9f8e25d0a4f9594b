use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{books, buyers, detail_orders, orders, products, ratings, users, vouchers};

pub use crate::entity::users::Role;

/// User record as exposed over the API; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub phone: String,
    pub gender: String,
    pub dob: NaiveDate,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// Buyer record without its activation code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Buyer {
    pub id: i64,
    pub phone: String,
    pub username: String,
    pub expired: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuyerSummary {
    pub id: i64,
    pub username: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    pub product_code: String,
    pub name: String,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: String,
    pub price: f64,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub order_code: String,
    pub user_id: Option<i32>,
    pub buyer_id: Option<i64>,
    pub total: f64,
    pub discount: f64,
    #[serde(rename = "desc")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetailOrder {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i32,
    pub price: f64,
    pub quantity: f64,
    pub sub_total: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rating {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i32,
    pub buyer_id: i64,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Voucher {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub expired_time: DateTime<Utc>,
    pub quantity_used: i32,
    pub quantity_max: i32,
    pub buyer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            phone: model.phone,
            gender: model.gender,
            dob: model.dob,
            address: model.address,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

impl From<buyers::Model> for Buyer {
    fn from(model: buyers::Model) -> Self {
        Self {
            id: model.id,
            phone: model.phone,
            username: model.username,
            expired: model.expired.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<buyers::Model> for BuyerSummary {
    fn from(model: buyers::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            phone: model.phone,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            product_code: model.product_code,
            name: model.name,
            image: model.image,
            product_type: model.product_type,
            price: model.price,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_code: model.order_code,
            user_id: model.user_id,
            buyer_id: model.buyer_id,
            total: model.total,
            discount: model.discount,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<detail_orders::Model> for DetailOrder {
    fn from(model: detail_orders::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            price: model.price,
            quantity: model.quantity,
            sub_total: model.sub_total,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<ratings::Model> for Rating {
    fn from(model: ratings::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            buyer_id: model.buyer_id,
            rating: model.rating,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<vouchers::Model> for Voucher {
    fn from(model: vouchers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            expired_time: model.expired_time.with_timezone(&Utc),
            quantity_used: model.quantity_used,
            quantity_max: model.quantity_max,
            buyer_id: model.buyer_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<books::Model> for Book {
    fn from(model: books::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            publisher: model.publisher,
            year: model.year,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
