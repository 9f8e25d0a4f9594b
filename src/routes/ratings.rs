use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::ratings::{CreateRatingRequest, ProductRatings, RatingView, UpdateRatingRequest},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{PageQuery, RatingQuery},
    services::rating_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ratings).post(create_rating))
        .route("/product/{product_id}", get(list_product_ratings))
        .route("/{id}", get(get_rating).put(update_rating).delete(delete_rating))
}

#[utoipa::path(
    get,
    path = "/api/ratings",
    params(RatingQuery),
    responses(
        (status = 200, description = "All ratings (admin only)", body = ApiResponse<Vec<RatingView>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn list_ratings(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<RatingQuery>,
) -> AppResult<Json<ApiResponse<Vec<RatingView>>>> {
    let resp = rating_service::list_ratings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ratings/product/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Ratings of one product with their average", body = ApiResponse<ProductRatings>)
    ),
    tag = "Ratings"
)]
pub async fn list_product_ratings(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<Json<ApiResponse<ProductRatings>>> {
    let resp = rating_service::list_product_ratings(&state, product_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ratings/{id}",
    params(("id" = i64, Path, description = "Rating ID")),
    responses(
        (status = 200, description = "Rating", body = ApiResponse<RatingView>),
        (status = 404, description = "Rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn get_rating(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<RatingView>>> {
    let resp = rating_service::get_rating(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ratings",
    request_body = CreateRatingRequest,
    responses(
        (status = 201, description = "Rating created", body = ApiResponse<RatingView>),
        (status = 400, description = "Out of range or already rated"),
        (status = 404, description = "Order, product or buyer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn create_rating(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<CreateRatingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RatingView>>)> {
    let resp = rating_service::create_rating(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/ratings/{id}",
    params(("id" = i64, Path, description = "Rating ID")),
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Rating updated", body = ApiResponse<RatingView>),
        (status = 404, description = "Rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn update_rating(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateRatingRequest>,
) -> AppResult<Json<ApiResponse<RatingView>>> {
    let resp = rating_service::update_rating(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/ratings/{id}",
    params(("id" = i64, Path, description = "Rating ID")),
    responses(
        (status = 200, description = "Rating deleted"),
        (status = 404, description = "Rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ratings"
)]
pub async fn delete_rating(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = rating_service::delete_rating(&state, id).await?;
    Ok(Json(resp))
}
