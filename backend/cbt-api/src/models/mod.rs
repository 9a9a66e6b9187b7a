use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

pub mod timer;

/// Whitespace-only input is as good as missing; length checks alone let it
/// through.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("cannot_be_blank"));
    }
    Ok(())
}

/// Registered exam taker. Credentials are name + phone (+ optional email),
/// matched exactly after trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl From<&Member> for MemberProfile {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            phone: member.phone.clone(),
        }
    }
}

/// Timing/ordering strategy for one exam attempt. Wire names match the
/// original question-bank data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamMode {
    #[serde(rename = "timedRandom")]
    TimedRandom,
    #[serde(rename = "untimedRandom")]
    UntimedRandom,
    #[serde(rename = "wrong")]
    WrongAnswerReview,
}

impl ExamMode {
    pub fn is_untimed(&self) -> bool {
        matches!(self, ExamMode::UntimedRandom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub choices: Vec<String>,
    /// Zero-based index into `choices`.
    pub answer: usize,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// The one in-progress exam attempt. At most one session is alive per store;
/// `user_id` is `None` for sessions written before ownership stamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub mode: ExamMode,
    pub questions: Vec<Question>,
    /// question id -> selected choice index
    #[serde(default)]
    pub answers: BTreeMap<u32, usize>,
    pub start_time: DateTime<Utc>,
    pub remaining_time: u32,
    /// Set by the manual 60-minute timer override; one-way.
    #[serde(default)]
    pub time_reset: bool,
}

impl ExamSession {
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub question_id: u32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginHistoryEntry {
    pub user_id: String,
    pub name: String,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name is required"),
        custom(function = not_blank)
    )]
    pub name: String,

    #[validate(
        length(min = 1, max = 32, message = "Phone number is required"),
        custom(function = not_blank)
    )]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, message = "Name is required"),
        custom(function = not_blank)
    )]
    pub name: String,

    #[validate(
        length(min = 1, message = "Phone number is required"),
        custom(function = not_blank)
    )]
    pub phone: String,

    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: MemberProfile,
    /// Present when a resumable session was found for this user; the client
    /// answers via the resume endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_prompt: Option<ResumePrompt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumePrompt {
    pub answered: usize,
    pub total: usize,
}

/// Outcome of the resume confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeChoice {
    Resume,
    Discard,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub choice: ResumeChoice,
}

#[derive(Debug, Deserialize)]
pub struct StartExamRequest {
    pub mode: ExamMode,
    /// Number of questions to draw; defaults to the full bank (or the whole
    /// wrong-answer book in review mode).
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: u32,
    pub choice: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
    /// 0..=100, passing mark is 60.
    pub score: u32,
    pub percentage: u32,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub report: ScoreReport,
    pub forced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PrintOption {
    #[default]
    #[serde(rename = "questionsOnly")]
    QuestionsOnly,
    #[serde(rename = "withAnswers")]
    WithAnswers,
    #[serde(rename = "withExplanations")]
    WithExplanations,
}

#[derive(Debug, Serialize)]
pub struct HintResponse {
    pub question_id: u32,
    pub hint: String,
}
