use anyhow::{Context, Result};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::{LOGINS_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::{
    LoginRequest, LoginResponse, Member, MemberProfile, RegisterRequest, ResumeChoice,
    ResumePrompt,
};
use crate::services::remote_log::RemoteLogClient;
use crate::storage::LocalStore;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9][0-9+\- ]{2,30}$").unwrap();
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// The message enumerates registered name/phone pairs. A debug-oriented
    /// behavior inherited from the original product, kept as specified.
    #[error("{0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Invalid phone number format")]
    InvalidPhone,

    #[error("A member with this name and phone number already exists")]
    Duplicate,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("No resumable exam session")]
    NoSession,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct LoginService {
    store: LocalStore,
    remote_log: RemoteLogClient,
}

impl LoginService {
    pub fn new(store: LocalStore, remote_log: RemoteLogClient) -> Self {
        Self { store, remote_log }
    }

    pub fn register(&self, req: &RegisterRequest) -> Result<Member, RegisterError> {
        let name = req.name.trim().to_string();
        let phone = req.phone.trim().to_string();
        let email = req
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if !PHONE_RE.is_match(&phone) {
            return Err(RegisterError::InvalidPhone);
        }

        let duplicate = self
            .store
            .get_members()
            .iter()
            .any(|m| m.name == name && m.phone == phone);
        if duplicate {
            return Err(RegisterError::Duplicate);
        }

        let member = Member {
            id: Uuid::new_v4().to_string(),
            name,
            phone,
            email,
            registered_at: Utc::now(),
        };
        self.store
            .add_member(member.clone())
            .context("Failed to persist new member")?;

        tracing::info!("Registered member {} ({})", member.name, member.id);
        Ok(member)
    }

    /// Credential check plus the session-resume negotiation. Local and remote
    /// login-history recording is best-effort and never blocks the flow.
    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse, LoginError> {
        let name = req.name.trim();
        let phone = req.phone.trim();
        let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());

        let Some(member) = self.store.get_member_by_credentials(name, phone, email) else {
            LOGINS_TOTAL.with_label_values(&["invalid"]).inc();
            return Err(LoginError::InvalidCredentials(self.unknown_member_message(
                name, phone, email,
            )));
        };

        tracing::info!("Login successful: {} ({})", member.name, member.id);
        LOGINS_TOTAL.with_label_values(&["success"]).inc();

        self.store
            .set_current_user(&member.id)
            .context("Failed to persist current user")?;

        // Local history: log and continue on failure.
        if !self.store.add_login_history(&member.id, &member.name) {
            tracing::warn!("Local login history write failed for {}", member.id);
        }

        // Remote history: detached, outcome never awaited here.
        self.remote_log.spawn_login_event(&member.id, &member.name);

        let resume_prompt = self.negotiate_resume(&member)?;

        Ok(LoginResponse {
            user: MemberProfile::from(&member),
            resume_prompt,
        })
    }

    fn unknown_member_message(&self, name: &str, phone: &str, email: Option<&str>) -> String {
        let members = self.store.get_members();
        if members.is_empty() {
            return "No members are registered yet. Please register first.".to_string();
        }

        let mut message = format!(
            "Unknown member.\n\nEntered name: \"{}\"\nEntered phone: \"{}\"",
            name, phone
        );
        if let Some(email) = email {
            message.push_str(&format!("\nEntered email: \"{}\"", email));
        }
        message.push_str("\n\nRegistered members:\n");
        for (i, m) in members.iter().enumerate() {
            message.push_str(&format!("{}. {} ({})\n", i + 1, m.name, m.phone));
        }
        message.push_str("\nName and phone number must match exactly.");
        message
    }

    /// Decides what happens to a persisted session found at login time:
    /// foreign sessions are discarded silently, resumable ones surface a
    /// prompt for the caller to answer.
    fn negotiate_resume(&self, member: &Member) -> Result<Option<ResumePrompt>> {
        let Some(mut session) = self.store.current_exam_session() else {
            return Ok(None);
        };

        if let Some(owner) = session.user_id.as_deref() {
            if owner != member.id {
                tracing::info!(
                    "Discarding exam session owned by another user ({})",
                    owner
                );
                self.store
                    .clear_current_exam_session()
                    .context("Failed to discard foreign session")?;
                SESSIONS_TOTAL.with_label_values(&["discarded"]).inc();
                SESSIONS_ACTIVE.dec();
                return Ok(None);
            }
        }

        if session.questions.is_empty() {
            return Ok(None);
        }

        // Sessions written before ownership stamping carry no owner; adopt
        // them for the current user.
        if session.user_id.is_none() {
            session.user_id = Some(member.id.clone());
            self.store
                .save_current_exam_session(&session)
                .context("Failed to stamp session owner")?;
        }

        Ok(Some(ResumePrompt {
            answered: session.answered_count(),
            total: session.questions.len(),
        }))
    }

    /// Applies the outcome of the resume dialog. `Resume` hands back the
    /// saved session; `Discard` clears it for a fresh start.
    pub fn apply_resume_choice(
        &self,
        choice: ResumeChoice,
    ) -> Result<Option<crate::models::ExamSession>, ResumeError> {
        match choice {
            ResumeChoice::Resume => {
                let session = self
                    .store
                    .current_exam_session()
                    .filter(|s| !s.questions.is_empty())
                    .ok_or(ResumeError::NoSession)?;
                tracing::info!(
                    "Resuming exam session ({}/{} answered)",
                    session.answered_count(),
                    session.questions.len()
                );
                Ok(Some(session))
            }
            ResumeChoice::Discard => {
                if self.store.current_exam_session().is_some() {
                    self.store
                        .clear_current_exam_session()
                        .context("Failed to clear session")?;
                    SESSIONS_TOTAL.with_label_values(&["discarded"]).inc();
                    SESSIONS_ACTIVE.dec();
                    tracing::info!("Discarded saved exam session at user request");
                }
                Ok(None)
            }
        }
    }
}
