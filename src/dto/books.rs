use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
}
