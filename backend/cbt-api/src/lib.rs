use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;
pub mod timer;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The browser client is served from a different origin during development.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/v1/auth", auth_routes())
        .route(
            "/api/v1/exam",
            post(handlers::exam::start_exam).get(handlers::exam::get_exam),
        )
        .nest("/api/v1/exam", exam_routes())
        .route(
            "/api/v1/questions/{id}/hint",
            get(handlers::exam::question_hint),
        )
        .route("/api/v1/wrong-answers", get(handlers::exam::list_wrong_answers))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/resume", post(handlers::auth::resume))
}

fn exam_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/answers", post(handlers::exam::submit_answer))
        .route("/reset-timer", post(handlers::exam::reset_timer))
        .route("/score", get(handlers::exam::get_score))
        .route("/complete", post(handlers::exam::complete_exam))
        .route("/stream", get(handlers::sse::exam_stream))
        .route("/print", get(handlers::exam::print_sheet))
}
