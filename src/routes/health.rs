use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ApiResponse;

/// Liveness only. The database is not probed.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    status: &'static str,
    version: &'static str,
    server_time: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = ApiResponse<HealthData>)),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::success(
        "Server berjalan",
        HealthData {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now(),
        },
    ))
}
