use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    models::timer::{TimeExpired, TimerEvent, TimerIdle, TimerTick},
    services::{session_service::SessionService, AppState},
    storage::LocalStore,
    timer::{ExamTimer, TickOutcome},
    utils::time::format_time,
};

/// SSE endpoint for exam timer events
/// GET /api/v1/exam/stream
///
/// One open stream owns one `ExamTimer`, the server counterpart of a mounted
/// exam screen: closing the connection tears the tick scheduler down with it.
pub async fn exam_stream(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .store
        .current_exam_session()
        .ok_or((StatusCode::NOT_FOUND, "No active exam session".to_string()))?;

    let timer = ExamTimer::from_session(&session);
    let tick_interval = tick_interval_ms();
    tracing::info!(
        "Client connected to timer stream ({} questions, {} answered, tick_interval={}ms)",
        session.questions.len(),
        session.answered_count(),
        tick_interval
    );

    let stream = create_timer_stream(
        state.store.clone(),
        timer,
        max_stream_ticks(),
        tick_interval,
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn max_stream_ticks() -> u64 {
    std::env::var("SSE_MAX_STREAM_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(3600)
}

fn tick_interval_ms() -> u64 {
    std::env::var("SSE_TICK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000)
}

struct StreamState {
    store: LocalStore,
    timer: ExamTimer,
    ticks: u64,
    max_ticks: u64,
    done: bool,
}

/// Per-tick loop: re-reads the persisted session so answer submissions and
/// the manual timer reset are picked up, recomputes the remaining budget, and
/// emits the expiry event exactly once before force-completing the session.
fn create_timer_stream(
    store: LocalStore,
    timer: ExamTimer,
    max_ticks: u64,
    tick_interval_ms: u64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        StreamState {
            store,
            timer,
            ticks: 0,
            max_ticks,
            done: false,
        },
        move |mut state| async move {
            if state.done || state.ticks > state.max_ticks {
                return None;
            }
            state.ticks += 1;

            // Session gone: completed or discarded elsewhere.
            let session = state.store.current_exam_session()?;

            if session.start_time != state.timer.start_time()
                || session.time_reset != state.timer.is_time_reset()
            {
                // Manual reset observed; restart from the persisted baseline.
                state.timer = ExamTimer::from_session(&session);
            } else {
                state
                    .timer
                    .sync_counts(session.questions.len(), session.answered_count());
            }

            let now = Utc::now();
            match state.timer.tick(now) {
                TickOutcome::Idle => {
                    let event = TimerEvent::TimerIdle(TimerIdle {
                        timestamp: now,
                        message: "This exam mode has no time limit".to_string(),
                    });
                    state.done = true;
                    Some((Ok(to_sse_event(&event)), state))
                }
                TickOutcome::Tick { remaining, elapsed } => {
                    let event = TimerEvent::TimerTick(TimerTick {
                        remaining_seconds: remaining,
                        elapsed_seconds: elapsed,
                        display: format_time(remaining),
                        timestamp: now,
                    });
                    sleep(Duration::from_millis(tick_interval_ms)).await;
                    Some((Ok(to_sse_event(&event)), state))
                }
                TickOutcome::Expired => {
                    // Force submission; clearing the session makes the forced
                    // completion idempotent across reconnects.
                    let service = SessionService::new(state.store.clone());
                    if let Err(e) = service.complete(true) {
                        tracing::error!("Forced submission failed: {}", e);
                    }
                    let event = TimerEvent::TimeExpired(TimeExpired {
                        timestamp: now,
                        message: "Exam time is over. The exam was submitted automatically."
                            .to_string(),
                    });
                    tracing::info!("Exam timer expired, stream closing");
                    state.done = true;
                    Some((Ok(to_sse_event(&event)), state))
                }
                TickOutcome::Exhausted => None,
            }
        },
    )
}

fn to_sse_event(event: &TimerEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.to_sse_data())
}
