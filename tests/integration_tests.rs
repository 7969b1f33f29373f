use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use parking_server::config::Config;
use parking_server::database::Database;
use parking_server::services::Notifier;
use parking_server::{create_app, AppState};

fn test_config() -> Config {
    Config {
        database_url: "postgresql://localhost/parking_unused".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        export_dir: "./exports".to_string(),
        chat_webhook_url: None,
        smtp_host: None,
        smtp_port: 587,
        smtp_from: "noreply@parking.local".to_string(),
        smtp_user: None,
        smtp_password: None,
        admin_email: None,
        admin_password: None,
        report_check_interval_secs: 3600,
    }
}

/// App over a lazy pool: requests that never reach Postgres can be tested
/// without a running database.
fn test_app() -> axum::Router {
    let config = test_config();
    let database = Database::connect_lazy(&config.database_url).expect("lazy pool");
    let notifier = Arc::new(Notifier::new(&config));
    create_app(AppState {
        database,
        config,
        notifier,
    })
}

#[tokio::test]
async fn liveness_answers_without_database() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for (method, uri) in [
        ("GET", "/api/v1/lots"),
        ("POST", "/api/v1/lots"),
        ("GET", "/api/v1/reservations"),
        ("POST", "/api/v1/exports"),
        ("GET", "/api/v1/statistics"),
        ("GET", "/api/v1/users/me"),
    ] {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should be rejected without a token"
        );
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/lots")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
