use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::books::{CreateBookRequest, UpdateBookRequest},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    models::Book,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::book_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
}

#[utoipa::path(
    get,
    path = "/api/book",
    params(SearchQuery),
    responses(
        (status = 200, description = "Books matching the title search", body = ApiResponse<Vec<Book>>)
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<Book>>>> {
    let resp = book_service::list_books(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/book/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = ApiResponse<Book>),
        (status = 404, description = "Book not found")
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::get_book(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/book",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = ApiResponse<Book>),
        (status = 400, description = "Missing field or title taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let resp = book_service::create_book(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/book/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = ApiResponse<Book>),
        (status = 404, description = "Book not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateBookRequest>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::update_book(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/book/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = book_service::delete_book(&state, &user, id).await?;
    Ok(Json(resp))
}
