use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use toko_api::{
    app::build_router,
    routes::health::health_check,
    services::token_service::TokenService,
    state::AppState,
};

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

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert!(response.0.status);

    let data = response.0.data.expect("health data");
    let data = serde_json::to_value(data).unwrap();
    assert_eq!(data["status"], "ok");
}

#[tokio::test]
async fn health_route_carries_request_id() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_path_gets_failure_envelope() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["data"], serde_json::Value::Null);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(Request::builder().uri("/api/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Access token diperlukan");
}

#[tokio::test]
async fn docs_are_served() {
    let app = build_router(offline_state());
    let response = app
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
