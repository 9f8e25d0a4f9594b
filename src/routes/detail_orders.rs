use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::detail_orders::{CreateDetailOrderRequest, DetailOrderView, UpdateDetailOrderRequest},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::DetailOrderQuery,
    services::detail_order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_detail_orders).post(create_detail_order))
        .route(
            "/{id}",
            get(get_detail_order)
                .put(update_detail_order)
                .delete(delete_detail_order),
        )
}

#[utoipa::path(
    get,
    path = "/api/detail-orders",
    params(DetailOrderQuery),
    responses(
        (status = 200, description = "Order lines", body = ApiResponse<Vec<DetailOrderView>>)
    ),
    tag = "Detail Orders"
)]
pub async fn list_detail_orders(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DetailOrderQuery>,
) -> AppResult<Json<ApiResponse<Vec<DetailOrderView>>>> {
    let resp = detail_order_service::list_detail_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/detail-orders/{id}",
    params(("id" = i64, Path, description = "Detail order ID")),
    responses(
        (status = 200, description = "Order line", body = ApiResponse<DetailOrderView>),
        (status = 404, description = "Detail order not found")
    ),
    tag = "Detail Orders"
)]
pub async fn get_detail_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<DetailOrderView>>> {
    let resp = detail_order_service::get_detail_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/detail-orders",
    request_body = CreateDetailOrderRequest,
    responses(
        (status = 201, description = "Order line created", body = ApiResponse<DetailOrderView>),
        (status = 400, description = "Missing field or bad amount"),
        (status = 404, description = "Order or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Detail Orders"
)]
pub async fn create_detail_order(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<CreateDetailOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DetailOrderView>>)> {
    let resp = detail_order_service::create_detail_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/detail-orders/{id}",
    params(("id" = i64, Path, description = "Detail order ID")),
    request_body = UpdateDetailOrderRequest,
    responses(
        (status = 200, description = "Order line updated", body = ApiResponse<DetailOrderView>),
        (status = 404, description = "Detail order, order or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Detail Orders"
)]
pub async fn update_detail_order(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateDetailOrderRequest>,
) -> AppResult<Json<ApiResponse<DetailOrderView>>> {
    let resp = detail_order_service::update_detail_order(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/detail-orders/{id}",
    params(("id" = i64, Path, description = "Detail order ID")),
    responses(
        (status = 200, description = "Order line deleted"),
        (status = 404, description = "Detail order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Detail Orders"
)]
pub async fn delete_detail_order(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = detail_order_service::delete_detail_order(&state, id).await?;
    Ok(Json(resp))
}
