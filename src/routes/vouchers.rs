use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};

use crate::{
    dto::vouchers::{CreateVoucherRequest, UpdateVoucherRequest, VoucherView},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::voucher_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vouchers).post(create_voucher))
        .route("/code/{code}", get(get_voucher_by_code))
        .route("/{id}/use", put(use_voucher))
        .route(
            "/{id}",
            get(get_voucher).put(update_voucher).delete(delete_voucher),
        )
}

#[utoipa::path(
    get,
    path = "/api/vouchers",
    params(SearchQuery),
    responses(
        (status = 200, description = "Vouchers", body = ApiResponse<Vec<VoucherView>>)
    ),
    tag = "Vouchers"
)]
pub async fn list_vouchers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<VoucherView>>>> {
    let resp = voucher_service::list_vouchers(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/code/{code}",
    params(("code" = String, Path, description = "Voucher code")),
    responses(
        (status = 200, description = "Voucher", body = ApiResponse<VoucherView>),
        (status = 404, description = "Voucher not found")
    ),
    tag = "Vouchers"
)]
pub async fn get_voucher_by_code(
    State(state): State<AppState>,
    AppPath(code): AppPath<String>,
) -> AppResult<Json<ApiResponse<VoucherView>>> {
    let resp = voucher_service::get_voucher_by_code(&state, &code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher ID")),
    responses(
        (status = 200, description = "Voucher", body = ApiResponse<VoucherView>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Voucher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn get_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<VoucherView>>> {
    let resp = voucher_service::get_voucher(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vouchers",
    request_body = CreateVoucherRequest,
    responses(
        (status = 201, description = "Voucher created", body = ApiResponse<VoucherView>),
        (status = 400, description = "Missing field or code taken"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn create_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateVoucherRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<VoucherView>>)> {
    let resp = voucher_service::create_voucher(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher ID")),
    request_body = UpdateVoucherRequest,
    responses(
        (status = 200, description = "Voucher updated", body = ApiResponse<VoucherView>),
        (status = 400, description = "Usage above maximum or code taken"),
        (status = 404, description = "Voucher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn update_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateVoucherRequest>,
) -> AppResult<Json<ApiResponse<VoucherView>>> {
    let resp = voucher_service::update_voucher(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vouchers/{id}/use",
    params(("id" = i32, Path, description = "Voucher ID")),
    responses(
        (status = 200, description = "One use consumed", body = ApiResponse<VoucherView>),
        (status = 400, description = "Voucher exhausted or expired"),
        (status = 404, description = "Voucher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn use_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<VoucherView>>> {
    let resp = voucher_service::use_voucher(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher ID")),
    responses(
        (status = 200, description = "Voucher deleted"),
        (status = 404, description = "Voucher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn delete_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = voucher_service::delete_voucher(&state, &user, id).await?;
    Ok(Json(resp))
}
