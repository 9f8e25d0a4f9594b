use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Buyer, UserProfile};

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    /// `admin` or `user`; defaults to `user`.
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    /// Email or username.
    pub identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct BuyerRegisterRequest {
    pub phone: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuyerRegisterPayload {
    pub buyer: Buyer,
    pub token: String,
    /// Returned directly until SMS delivery exists.
    #[serde(rename = "activationCode")]
    pub activation_code: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct BuyerLoginRequest {
    pub phone: Option<String>,
    #[serde(rename = "activationCode")]
    pub activation_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuyerAuthPayload {
    pub buyer: Buyer,
    pub token: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}
