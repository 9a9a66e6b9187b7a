use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::models::{LoginRequest, MemberProfile, RegisterRequest, ResumeRequest};
use crate::services::{
    login_service::{LoginError, LoginService, RegisterError, ResumeError},
    AppState,
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    let service = LoginService::new(state.store.clone(), state.remote_log.clone());
    match service.register(&req) {
        Ok(member) => Ok((StatusCode::CREATED, Json(MemberProfile::from(&member)))),
        Err(RegisterError::InvalidPhone) => {
            Err((StatusCode::BAD_REQUEST, RegisterError::InvalidPhone.to_string()))
        }
        Err(RegisterError::Duplicate) => {
            Err((StatusCode::CONFLICT, RegisterError::Duplicate.to_string()))
        }
        Err(RegisterError::Internal(e)) => {
            tracing::error!("Registration failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    tracing::info!("Login attempt: name={}", req.name.trim());

    let service = LoginService::new(state.store.clone(), state.remote_log.clone());
    match service.login(&req) {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(LoginError::InvalidCredentials(message)) => {
            Err((StatusCode::UNAUTHORIZED, message))
        }
        Err(LoginError::Internal(e)) => {
            tracing::error!("Login failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Second half of the resume dialog: the client answers the prompt returned
/// by `login` with resume or discard.
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResumeRequest>,
) -> Result<axum::response::Response, (StatusCode, String)> {
    let service = LoginService::new(state.store.clone(), state.remote_log.clone());
    match service.apply_resume_choice(req.choice) {
        Ok(Some(session)) => Ok((StatusCode::OK, Json(session)).into_response()),
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(ResumeError::NoSession) => Err((
            StatusCode::NOT_FOUND,
            ResumeError::NoSession.to_string(),
        )),
        Err(ResumeError::Internal(e)) => {
            tracing::error!("Resume failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
