use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{HintResponse, PrintOption, StartExamRequest, SubmitAnswerRequest};
use crate::services::{
    print_service::PrintService,
    session_service::{SessionError, SessionService},
    AppState,
};
use crate::utils::time::format_time;

fn session_error_response(e: SessionError) -> (StatusCode, String) {
    let status = match &e {
        SessionError::NoActiveSession | SessionError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
        SessionError::InvalidChoice { .. } | SessionError::EmptyWrongAnswerBook => {
            StatusCode::BAD_REQUEST
        }
        SessionError::Internal(inner) => {
            tracing::error!("Exam operation failed: {}", inner);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

pub async fn start_exam(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartExamRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(user_id) = state.store.current_user() else {
        return Err((StatusCode::UNAUTHORIZED, "Not logged in".to_string()));
    };

    let service = SessionService::new(state.store.clone());
    match service.start_exam(&user_id, req.mode, req.count) {
        Ok(session) => Ok((StatusCode::CREATED, Json(session))),
        Err(e) => Err(session_error_response(e)),
    }
}

pub async fn get_exam(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    match service.current_session() {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => Err(session_error_response(e)),
    }
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    match service.submit_answer(req.question_id, req.choice) {
        Ok(session) => Ok((
            StatusCode::OK,
            Json(json!({
                "answered": session.answered_count(),
                "total": session.questions.len(),
            })),
        )),
        Err(e) => Err(session_error_response(e)),
    }
}

pub async fn reset_timer(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    match service.reset_timer() {
        Ok(session) => Ok((
            StatusCode::OK,
            Json(json!({
                "remaining_time": session.remaining_time,
                "display": format_time(session.remaining_time),
                "time_reset": session.time_reset,
            })),
        )),
        Err(e) => Err(session_error_response(e)),
    }
}

pub async fn get_score(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    match service.score() {
        Ok(report) => Ok((StatusCode::OK, Json(report))),
        Err(e) => Err(session_error_response(e)),
    }
}

pub async fn complete_exam(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    match service.complete(false) {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(e) => Err(session_error_response(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct PrintQuery {
    pub option: Option<PrintOption>,
}

pub async fn print_sheet(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PrintQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SessionService::new(state.store.clone());
    let session = service.current_session().map_err(session_error_response)?;

    let option = query.option.unwrap_or_default();
    let bytes = PrintService::build_sheet("CBT question sheet", &session.questions, option)
        .map_err(|e| {
            tracing::error!("Failed to build print sheet: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"question-sheet.pdf\"",
            ),
        ],
        bytes,
    ))
}

pub async fn question_hint(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<u32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(question) = state.store.find_question(question_id) else {
        return Err((StatusCode::NOT_FOUND, "Question not found".to_string()));
    };

    // Fall back to the explanation when no dedicated hint exists.
    let hint = question.hint.unwrap_or(question.explanation);
    Ok((
        StatusCode::OK,
        Json(HintResponse { question_id, hint }),
    ))
}

pub async fn list_wrong_answers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.store.get_wrong_answers()))
}
