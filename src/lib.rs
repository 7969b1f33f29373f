use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/lots",
            get(handlers::lots::list_lots).post(handlers::lots::create_lot),
        )
        .route(
            "/lots/:id",
            get(handlers::lots::get_lot)
                .put(handlers::lots::update_lot)
                .delete(handlers::lots::delete_lot),
        )
        .route(
            "/lots/:id/reservations",
            post(handlers::reservations::allocate),
        )
        .route("/reservations", get(handlers::reservations::my_reservations))
        .route(
            "/reservations/:id/occupy",
            post(handlers::reservations::occupy),
        )
        .route(
            "/reservations/:id/release",
            post(handlers::reservations::release),
        )
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::users::me))
        .route(
            "/users/:id/reservations",
            get(handlers::reservations::user_reservations),
        )
        .route("/statistics", get(handlers::statistics::system))
        .route("/statistics/me", get(handlers::statistics::mine))
        .route("/exports", post(handlers::exports::submit))
        .route("/exports/:job_id", get(handlers::exports::poll))
        .route(
            "/exports/:job_id/download",
            get(handlers::exports::download),
        );

    Router::new()
        .nest("/api/v1", api)
        .route("/health/live", get(handlers::health::live))
        .route("/health/ready", get(handlers::health::ready))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
