use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod auth;
pub mod exam;
pub mod sse;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let bank_size = state.store.question_bank().len();
    let store_status = if bank_size > 0 { "healthy" } else { "empty" };

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "cbt-exam-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": {
                "store": {
                    "status": store_status,
                    "question_bank_size": bank_size,
                }
            }
        })),
    )
}

pub async fn metrics_handler() -> Result<impl IntoResponse, (StatusCode, String)> {
    match metrics::render() {
        Ok(body) => Ok((
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            ))
        }
    }
}
