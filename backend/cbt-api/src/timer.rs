//! Exam countdown state machine.
//!
//! One `ExamTimer` is owned by one open timer stream (the server counterpart
//! of a mounted exam screen). The budget rules are deliberately those of the
//! original product: a flat 60-minute budget until the first answer is
//! recorded, then one minute per still-unanswered question, always measured
//! from the original start instant. Finishing questions therefore shrinks the
//! total budget retroactively; `reset` is the one-way escape back to a flat
//! 60 minutes.

use chrono::{DateTime, Utc};

use crate::models::{ExamMode, ExamSession};

pub const EXAM_DURATION_SECS: u32 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No countdown: empty question set or untimed mode.
    Idle,
    Counting,
    /// Terminal until `reset` or a fresh screen.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Tick { remaining: u32, elapsed: u32 },
    /// The transition into `Expired`; reported exactly once per counting
    /// episode.
    Expired,
    /// Ticked again after expiry was already reported.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct ExamTimer {
    start_time: DateTime<Utc>,
    duration_secs: u32,
    questions_count: usize,
    answers_count: usize,
    is_time_reset: bool,
    untimed: bool,
    phase: TimerPhase,
}

impl ExamTimer {
    pub fn new(
        start_time: DateTime<Utc>,
        mode: ExamMode,
        questions_count: usize,
        answers_count: usize,
        is_time_reset: bool,
    ) -> Self {
        let untimed = mode.is_untimed();
        let phase = if questions_count == 0 || untimed {
            TimerPhase::Idle
        } else {
            TimerPhase::Counting
        };

        Self {
            start_time,
            duration_secs: EXAM_DURATION_SECS,
            questions_count,
            answers_count,
            is_time_reset,
            untimed,
            phase,
        }
    }

    pub fn from_session(session: &ExamSession) -> Self {
        Self::new(
            session.start_time,
            session.mode,
            session.questions.len(),
            session.answered_count(),
            session.time_reset,
        )
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn is_time_reset(&self) -> bool {
        self.is_time_reset
    }

    /// Counts change between ticks as answers come in; the elapsed baseline
    /// is left untouched.
    pub fn sync_counts(&mut self, questions_count: usize, answers_count: usize) {
        self.questions_count = questions_count;
        self.answers_count = answers_count;
        // An Idle timer for a timed mode only existed because the set was
        // empty; it starts counting once questions arrive. An untimed timer
        // never does.
        if self.phase == TimerPhase::Idle && questions_count > 0 && !self.untimed {
            self.phase = TimerPhase::Counting;
        }
    }

    fn elapsed_at(&self, now: DateTime<Utc>) -> u32 {
        (now - self.start_time).num_seconds().max(0) as u32
    }

    /// Remaining seconds under the active budget rule.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = self.elapsed_at(now);
        let budget = if self.is_time_reset || self.answers_count == 0 {
            self.duration_secs
        } else {
            let unanswered = self.questions_count.saturating_sub(self.answers_count);
            (unanswered as u32).saturating_mul(60)
        };
        budget.saturating_sub(elapsed)
    }

    /// One periodic recomputation. Expiry is observed on the tick where the
    /// remaining time reaches zero and never again afterwards.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        match self.phase {
            TimerPhase::Idle => TickOutcome::Idle,
            TimerPhase::Expired => TickOutcome::Exhausted,
            TimerPhase::Counting => {
                let remaining = self.remaining_at(now);
                if remaining == 0 {
                    self.phase = TimerPhase::Expired;
                    TickOutcome::Expired
                } else {
                    TickOutcome::Tick {
                        remaining,
                        elapsed: self.elapsed_at(now),
                    }
                }
            }
        }
    }

    /// Manual one-way override: restart the countdown at a flat 60 minutes
    /// from `now`, escaping the per-question budget (and `Expired`).
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.start_time = now;
        self.is_time_reset = true;
        if self.phase != TimerPhase::Idle {
            self.phase = TimerPhase::Counting;
        }
        tracing::info!("Exam timer reset to a flat {}s budget", self.duration_secs);
    }

    pub fn remaining_after_reset(&self) -> u32 {
        self.duration_secs
    }
}
