mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, memory_state_with_rate_limit};
use serde_json::json;
use shopfront::config::RateLimitConfig;
use shopfront::router::init_router;
use tower::ServiceExt;

fn strict_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        window_secs: 900,
        max_requests: 2,
    }
}

fn from_ip(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_api_rate_limit_exceeded() {
    let (state, _) = memory_state_with_rate_limit(strict_config());
    let app = init_router(state);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(from_ip("/api/products", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(from_ip("/api/products", "10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Too many requests, please try again later"})
    );
}

#[tokio::test]
async fn test_rate_limit_is_per_client_ip() {
    let (state, _) = memory_state_with_rate_limit(strict_config());
    let app = init_router(state);

    for _ in 0..3 {
        app.clone()
            .oneshot(from_ip("/api/products", "10.0.0.1"))
            .await
            .unwrap();
    }

    let response = app
        .oneshot(from_ip("/api/products", "10.0.0.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_limit_is_shared_across_api_routes() {
    let (state, _) = memory_state_with_rate_limit(strict_config());
    let app = init_router(state);

    app.clone()
        .oneshot(from_ip("/api/products", "10.0.0.3"))
        .await
        .unwrap();
    app.clone()
        .oneshot(from_ip("/api/products/stats", "10.0.0.3"))
        .await
        .unwrap();

    let response = app
        .oneshot(from_ip("/api/products/search?name=x", "10.0.0.3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let (state, _) = memory_state_with_rate_limit(strict_config());
    let app = init_router(state);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(from_ip("/health", "10.0.0.4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }
}

#[tokio::test]
async fn test_disabled_limiter_lets_everything_through() {
    let (state, _) = memory_state_with_rate_limit(RateLimitConfig::disabled());
    let app = init_router(state);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(from_ip("/api/products", "10.0.0.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
