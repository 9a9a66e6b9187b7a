use anyhow::Context;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::metrics::{
    ANSWERS_SUBMITTED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL, TIMER_EXPIRATIONS_TOTAL,
};
use crate::models::{CompleteResponse, ExamMode, ExamSession, Question, ScoreReport};
use crate::storage::LocalStore;
use crate::timer::{ExamTimer, EXAM_DURATION_SECS};

pub const PASSING_SCORE: u32 = 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active exam session")]
    NoActiveSession,

    #[error("Question {0} is not part of the current exam")]
    UnknownQuestion(u32),

    #[error("Choice index {choice} is out of range for question {question_id}")]
    InvalidChoice { question_id: u32, choice: usize },

    #[error("The wrong-answer book is empty")]
    EmptyWrongAnswerBook,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct SessionService {
    store: LocalStore,
}

impl SessionService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Starts a fresh exam for `user_id`, replacing any previous session.
    pub fn start_exam(
        &self,
        user_id: &str,
        mode: ExamMode,
        count: Option<usize>,
    ) -> Result<ExamSession, SessionError> {
        let questions = match mode {
            ExamMode::WrongAnswerReview => self.wrong_answer_questions()?,
            ExamMode::TimedRandom | ExamMode::UntimedRandom => {
                let mut bank = self.store.question_bank();
                let mut rng = rand::rng();
                bank.shuffle(&mut rng);
                if let Some(count) = count {
                    bank.truncate(count);
                }
                bank
            }
        };

        if self.store.current_exam_session().is_some() {
            SESSIONS_TOTAL.with_label_values(&["discarded"]).inc();
        } else {
            SESSIONS_ACTIVE.inc();
        }

        let session = ExamSession {
            user_id: Some(user_id.to_string()),
            mode,
            questions,
            answers: BTreeMap::new(),
            start_time: Utc::now(),
            remaining_time: EXAM_DURATION_SECS,
            time_reset: false,
        };
        self.store
            .save_current_exam_session(&session)
            .context("Failed to persist new session")?;

        SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        tracing::info!(
            "Exam started for user {} ({:?}, {} questions)",
            user_id,
            mode,
            session.questions.len()
        );

        Ok(session)
    }

    fn wrong_answer_questions(&self) -> Result<Vec<Question>, SessionError> {
        let book = self.store.get_wrong_answers();
        if book.is_empty() {
            return Err(SessionError::EmptyWrongAnswerBook);
        }
        let questions: Vec<Question> = book
            .iter()
            .filter_map(|w| self.store.find_question(w.question_id))
            .collect();
        if questions.is_empty() {
            return Err(SessionError::EmptyWrongAnswerBook);
        }
        Ok(questions)
    }

    pub fn current_session(&self) -> Result<ExamSession, SessionError> {
        self.store
            .current_exam_session()
            .ok_or(SessionError::NoActiveSession)
    }

    pub fn submit_answer(
        &self,
        question_id: u32,
        choice: usize,
    ) -> Result<ExamSession, SessionError> {
        let mut session = self.current_session()?;

        let question = session
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(SessionError::UnknownQuestion(question_id))?;
        if choice >= question.choices.len() {
            return Err(SessionError::InvalidChoice {
                question_id,
                choice,
            });
        }

        session.answers.insert(question_id, choice);
        self.store
            .save_current_exam_session(&session)
            .context("Failed to persist answer")?;
        ANSWERS_SUBMITTED_TOTAL.inc();

        Ok(session)
    }

    /// Manual timer override: flat 60 minutes from now, persisted so an open
    /// timer stream picks it up on its next tick.
    pub fn reset_timer(&self) -> Result<ExamSession, SessionError> {
        let mut session = self.current_session()?;

        let mut timer = ExamTimer::from_session(&session);
        let now = Utc::now();
        timer.reset(now);

        session.start_time = timer.start_time();
        session.remaining_time = timer.remaining_after_reset();
        session.time_reset = timer.is_time_reset();
        self.store
            .save_current_exam_session(&session)
            .context("Failed to persist timer reset")?;

        Ok(session)
    }

    /// Pure scoring of the current session; no store mutation.
    pub fn score(&self) -> Result<ScoreReport, SessionError> {
        let session = self.current_session()?;
        Ok(build_report(&session))
    }

    /// Finishes the exam: updates the wrong-answer book from the results and
    /// clears the session. `forced` marks a timer-driven auto-submission;
    /// clearing the session guarantees it can happen at most once.
    pub fn complete(&self, forced: bool) -> Result<CompleteResponse, SessionError> {
        let session = self.current_session()?;
        let report = build_report(&session);

        for question in &session.questions {
            let answered = session.answers.get(&question.id);
            match (session.mode, answered) {
                // Review mode: a now-correct question leaves the book.
                (ExamMode::WrongAnswerReview, Some(&choice)) if choice == question.answer => {
                    self.store
                        .remove_wrong_answer(question.id)
                        .context("Failed to update wrong-answer book")?;
                }
                (ExamMode::WrongAnswerReview, _) => {}
                // Timed/untimed: a missed question enters the book.
                (_, Some(&choice)) if choice != question.answer => {
                    self.store
                        .add_wrong_answer(question.id)
                        .context("Failed to update wrong-answer book")?;
                }
                _ => {}
            }
        }

        self.store
            .clear_current_exam_session()
            .context("Failed to clear completed session")?;
        SESSIONS_ACTIVE.dec();
        if forced {
            SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
            TIMER_EXPIRATIONS_TOTAL.inc();
            tracing::info!("Exam auto-submitted after timer expiry");
        } else {
            SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
            tracing::info!("Exam submitted (score {})", report.score);
        }

        Ok(CompleteResponse { report, forced })
    }
}

fn build_report(session: &ExamSession) -> ScoreReport {
    let total = session.questions.len();
    let mut correct = 0usize;
    let mut wrong = 0usize;
    for question in &session.questions {
        match session.answers.get(&question.id) {
            Some(&choice) if choice == question.answer => correct += 1,
            Some(_) => wrong += 1,
            None => {}
        }
    }
    let unanswered = total - correct - wrong;
    let answered = correct + wrong;

    let score = ratio_percent(correct, total);

    if session.mode == ExamMode::WrongAnswerReview {
        let percentage = ratio_percent(correct, answered);
        ScoreReport {
            total,
            correct,
            wrong,
            unanswered,
            score,
            percentage,
            passed: score >= PASSING_SCORE,
            answered_count: Some(answered),
            encouragement: Some(encouragement_for(percentage, answered)),
        }
    } else {
        ScoreReport {
            total,
            correct,
            wrong,
            unanswered,
            score,
            percentage: score,
            passed: score >= PASSING_SCORE,
            answered_count: None,
            encouragement: None,
        }
    }
}

fn ratio_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn encouragement_for(percentage: u32, answered: usize) -> String {
    if answered == 0 {
        "Give the review another try — answer a few questions first!".to_string()
    } else if percentage >= 80 {
        "Excellent! Those mistakes are nearly cleared.".to_string()
    } else if percentage >= 50 {
        "Good progress — keep working through your weak spots.".to_string()
    } else {
        "Keep at it. Repetition is how wrong answers become right ones.".to_string()
    }
}
