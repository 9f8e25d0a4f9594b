use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use sea_orm::EntityTrait;

use crate::{
    entity::{Buyers, Users, buyers, users},
    error::{AppError, AppResult},
    models::Role,
    services::token_service::{BuyerClaims, TokenError, UserClaims},
    state::AppState,
};

/// Authenticated user, re-loaded from the store on every request so that deleted
/// accounts and role changes take effect without revoking tokens.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Authenticated buyer, resolved the same way from a buyer token.
#[derive(Debug, Clone)]
pub struct AuthBuyer {
    pub id: i64,
    pub username: String,
    pub phone: String,
}

impl From<users::Model> for AuthUser {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
        }
    }
}

impl From<buyers::Model> for AuthBuyer {
    fn from(model: buyers::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            phone: model.phone,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Fails with 401 when there is no identity and 403 when its role is not allowed.
pub fn authorize(identity: Option<&AuthUser>, allowed: &[Role]) -> AppResult<()> {
    let user = identity
        .ok_or_else(|| AppError::Unauthorized("User tidak terautentikasi".into()))?;
    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden(
            "Anda tidak memiliki akses untuk resource ini".into(),
        ));
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> AppResult<()> {
    authorize(Some(user), &[Role::Admin])
}

/// Admins pass; everyone else only reaches resources keyed by their own id.
pub fn ensure_owner(user: &AuthUser, owner_id: impl Into<Option<i32>>) -> AppResult<()> {
    if user.is_admin() || owner_id.into() == Some(user.id) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Anda hanya bisa mengakses data milik Anda sendiri".into(),
    ))
}

pub fn ensure_buyer_owner(buyer: &AuthBuyer, buyer_id: i64) -> AppResult<()> {
    if buyer.id == buyer_id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Anda hanya bisa mengakses data milik Anda sendiri".into(),
    ))
}

pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let missing = || AppError::Unauthorized("Access token diperlukan".into());
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(missing)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(missing)?;
    Ok(token)
}

fn token_rejection(err: TokenError) -> AppError {
    match err {
        TokenError::Expired => AppError::Unauthorized(err.to_string()),
        TokenError::Invalid => {
            tracing::warn!("rejected invalid bearer token");
            AppError::Forbidden(err.to_string())
        }
        TokenError::Encoding(msg) => AppError::Internal(anyhow::anyhow!(msg)),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state
            .tokens
            .verify::<UserClaims>(token)
            .map_err(token_rejection)?;

        let user = Users::find_by_id(claims.identity.user_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("Token tidak valid atau user tidak ditemukan".into())
            })?;

        Ok(AuthUser::from(user))
    }
}

impl FromRequestParts<AppState> for AuthBuyer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state
            .tokens
            .verify::<BuyerClaims>(token)
            .map_err(token_rejection)?;

        let buyer = Buyers::find_by_id(claims.identity.buyer_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("Token tidak valid atau buyer tidak ditemukan".into())
            })?;

        Ok(AuthBuyer::from(buyer))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use chrono::Duration;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    use super::*;
    use crate::services::token_service::TokenService;

    fn user(id: i32, role: Role) -> AuthUser {
        AuthUser {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            role,
        }
    }

    #[test]
    fn authorize_requires_identity_then_role() {
        let err = authorize(None, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = authorize(Some(&user(1, Role::User)), &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        assert!(authorize(Some(&user(1, Role::User)), &[Role::Admin, Role::User]).is_ok());
        assert!(ensure_admin(&user(2, Role::Admin)).is_ok());
    }

    #[test]
    fn ownership_allows_self_and_admins() {
        assert!(ensure_owner(&user(3, Role::User), 3).is_ok());
        assert!(ensure_owner(&user(9, Role::Admin), 3).is_ok());
        assert!(matches!(
            ensure_owner(&user(4, Role::User), 3),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_owner(&user(4, Role::User), None),
            Err(AppError::Forbidden(_))
        ));

        let buyer = AuthBuyer {
            id: 10,
            username: "budi".into(),
            phone: "0812".into(),
        };
        assert!(ensure_buyer_owner(&buyer, 10).is_ok());
        assert!(ensure_buyer_owner(&buyer, 11).is_err());
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    fn offline_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AppState {
            pool,
            orm: DatabaseConnection::Disconnected,
            tokens: TokenService::new("test-secret-key-for-jwt-testing-minimum-32-chars", 24),
        }
    }

    async fn status_for(state: AppState, authorization: Option<String>) -> StatusCode {
        async fn protected(_user: AuthUser) -> &'static str {
            "ok"
        }
        let app = Router::new()
            .route("/protected", get(protected))
            .with_state(state);

        let mut request = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        assert_eq!(status_for(offline_state(), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let state = offline_state();
        let claims = UserClaims {
            user_id: 1,
            username: "siti".into(),
            role: Role::User,
        };
        let token = state.tokens.issue(&claims, Duration::seconds(-30)).unwrap();
        assert_eq!(
            status_for(state, Some(format!("Bearer {token}"))).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn invalid_token_is_forbidden() {
        assert_eq!(
            status_for(offline_state(), Some("Bearer not-a-jwt".into())).await,
            StatusCode::FORBIDDEN
        );
    }
}
