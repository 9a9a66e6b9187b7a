use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    pub static ref LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cbt_logins_total",
        "Total number of login attempts",
        &["result"]
    )
    .unwrap();

    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cbt_exam_sessions_total",
        "Exam session lifecycle events",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "cbt_exam_sessions_active",
        "Number of currently active exam sessions"
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounter = register_int_counter!(
        "cbt_answers_submitted_total",
        "Total number of submitted answers"
    )
    .unwrap();

    pub static ref TIMER_EXPIRATIONS_TOTAL: IntCounter = register_int_counter!(
        "cbt_timer_expirations_total",
        "Exam timers that ran out and forced a submission"
    )
    .unwrap();

    pub static ref PRINT_SHEETS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cbt_print_sheets_total",
        "Generated printable question sheets",
        &["option"]
    )
    .unwrap();
}

/// Renders all registered metrics in Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
