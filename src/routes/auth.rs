use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::{
    dto::auth::{
        AuthPayload, BuyerAuthPayload, BuyerLoginRequest, BuyerRegisterPayload,
        BuyerRegisterRequest, ChangePasswordRequest, LoginRequest, RegisterRequest,
        UpdateProfileRequest,
    },
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/buyer/register", post(register_buyer))
        .route("/buyer/login", post(login_buyer))
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", put(change_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AuthPayload>),
        (status = 400, description = "Missing field, bad role or email/username taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthPayload>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/buyer/register",
    request_body = BuyerRegisterRequest,
    responses(
        (status = 201, description = "Register buyer; the activation code is returned once", body = ApiResponse<BuyerRegisterPayload>),
        (status = 400, description = "Phone or username taken")
    ),
    tag = "Auth"
)]
pub async fn register_buyer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BuyerRegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BuyerRegisterPayload>>)> {
    let resp = auth_service::register_buyer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/buyer/login",
    request_body = BuyerLoginRequest,
    responses(
        (status = 200, description = "Login buyer", body = ApiResponse<BuyerAuthPayload>),
        (status = 401, description = "Unknown phone, wrong or expired code")
    ),
    tag = "Auth"
)]
pub async fn login_buyer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BuyerLoginRequest>,
) -> AppResult<Json<ApiResponse<BuyerAuthPayload>>> {
    let resp = auth_service::login_buyer(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Email or username used by another user")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = auth_service::change_password(&state, &user, payload).await?;
    Ok(Json(resp))
}
