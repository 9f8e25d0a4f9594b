use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::buyers::{BuyerDetail, CreateBuyerRequest, UpdateBuyerRequest},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::{AuthBuyer, AuthUser},
    models::Buyer,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::buyer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_buyers).post(create_buyer))
        .route("/{id}", get(get_buyer).put(update_buyer).delete(delete_buyer))
}

#[utoipa::path(
    get,
    path = "/api/buyers",
    params(SearchQuery),
    responses(
        (status = 200, description = "Buyers", body = ApiResponse<Vec<Buyer>>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Buyers"
)]
pub async fn list_buyers(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<Buyer>>>> {
    let resp = buyer_service::list_buyers(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/buyers/{id}",
    params(("id" = i64, Path, description = "Buyer ID")),
    responses(
        (status = 200, description = "Buyer with vouchers, orders and ratings", body = ApiResponse<BuyerDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Buyer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Buyers"
)]
pub async fn get_buyer(
    State(state): State<AppState>,
    buyer: AuthBuyer,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<BuyerDetail>>> {
    let resp = buyer_service::get_buyer(&state, &buyer, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/buyers",
    request_body = CreateBuyerRequest,
    responses(
        (status = 201, description = "Buyer created", body = ApiResponse<Buyer>),
        (status = 400, description = "Missing field or phone/username taken")
    ),
    tag = "Buyers"
)]
pub async fn create_buyer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBuyerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Buyer>>)> {
    let resp = buyer_service::create_buyer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/buyers/{id}",
    params(("id" = i64, Path, description = "Buyer ID")),
    request_body = UpdateBuyerRequest,
    responses(
        (status = 200, description = "Buyer updated", body = ApiResponse<Buyer>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Buyer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Buyers"
)]
pub async fn update_buyer(
    State(state): State<AppState>,
    buyer: AuthBuyer,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateBuyerRequest>,
) -> AppResult<Json<ApiResponse<Buyer>>> {
    let resp = buyer_service::update_buyer(&state, &buyer, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/buyers/{id}",
    params(("id" = i64, Path, description = "Buyer ID")),
    responses(
        (status = 200, description = "Buyer deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Buyer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Buyers"
)]
pub async fn delete_buyer(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = buyer_service::delete_buyer(&state, &user, id).await?;
    Ok(Json(resp))
}
