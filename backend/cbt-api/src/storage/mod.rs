//! Local JSON persistence — the server-side counterpart of the browser's
//! localStorage. Each key lives in its own file under `data_dir`; everything
//! is read into memory once and written through atomically (temp file +
//! rename) on mutation.
//!
//! Access is synchronous behind a single `RwLock`; there is no cross-process
//! coordination, matching the one-client-per-store model.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::models::{ExamSession, LoginHistoryEntry, Member, Question, WrongAnswer};

const MEMBERS_KEY: &str = "members";
const QUESTIONS_KEY: &str = "questions";
const CURRENT_SESSION_KEY: &str = "current_session";
const CURRENT_USER_KEY: &str = "current_user";
const LOGIN_HISTORY_KEY: &str = "login_history";
const WRONG_ANSWERS_KEY: &str = "wrong_answers";

#[derive(Debug, Default)]
struct StoreData {
    members: Vec<Member>,
    questions: Vec<Question>,
    current_session: Option<ExamSession>,
    current_user: Option<String>,
    login_history: Vec<LoginHistoryEntry>,
    wrong_answers: Vec<WrongAnswer>,
}

#[derive(Clone)]
pub struct LocalStore {
    data_dir: Arc<PathBuf>,
    data: Arc<RwLock<StoreData>>,
}

impl LocalStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        let data = StoreData {
            members: read_key(&data_dir, MEMBERS_KEY)?.unwrap_or_default(),
            questions: read_key(&data_dir, QUESTIONS_KEY)?.unwrap_or_default(),
            current_session: read_key(&data_dir, CURRENT_SESSION_KEY)?,
            current_user: read_key(&data_dir, CURRENT_USER_KEY)?,
            login_history: read_key(&data_dir, LOGIN_HISTORY_KEY)?.unwrap_or_default(),
            wrong_answers: read_key(&data_dir, WRONG_ANSWERS_KEY)?.unwrap_or_default(),
        };

        tracing::info!(
            "Local store opened at {} ({} members, {} questions)",
            data_dir.display(),
            data.members.len(),
            data.questions.len()
        );

        Ok(Self {
            data_dir: Arc::new(data_dir),
            data: Arc::new(RwLock::new(data)),
        })
    }

    // --- members ---

    pub fn get_members(&self) -> Vec<Member> {
        self.data.read().expect("store lock poisoned").members.clone()
    }

    /// Exact case-sensitive match on trimmed name and phone; email is only
    /// compared when the caller supplied one.
    pub fn get_member_by_credentials(
        &self,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> Option<Member> {
        let data = self.data.read().expect("store lock poisoned");
        data.members
            .iter()
            .find(|m| {
                m.name == name
                    && m.phone == phone
                    && match email {
                        Some(email) if !email.is_empty() => m.email.as_deref() == Some(email),
                        _ => true,
                    }
            })
            .cloned()
    }

    pub fn add_member(&self, member: Member) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.members.push(member);
        write_key(&self.data_dir, MEMBERS_KEY, &data.members)
    }

    pub fn set_current_user(&self, user_id: &str) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.current_user = Some(user_id.to_string());
        write_key(&self.data_dir, CURRENT_USER_KEY, &data.current_user)
    }

    pub fn current_user(&self) -> Option<String> {
        self.data
            .read()
            .expect("store lock poisoned")
            .current_user
            .clone()
    }

    // --- question bank ---

    pub fn question_bank(&self) -> Vec<Question> {
        self.data
            .read()
            .expect("store lock poisoned")
            .questions
            .clone()
    }

    pub fn find_question(&self, question_id: u32) -> Option<Question> {
        let data = self.data.read().expect("store lock poisoned");
        data.questions.iter().find(|q| q.id == question_id).cloned()
    }

    pub fn replace_question_bank(&self, questions: Vec<Question>) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.questions = questions;
        write_key(&self.data_dir, QUESTIONS_KEY, &data.questions)
    }

    // --- exam session ---

    pub fn current_exam_session(&self) -> Option<ExamSession> {
        self.data
            .read()
            .expect("store lock poisoned")
            .current_session
            .clone()
    }

    pub fn save_current_exam_session(&self, session: &ExamSession) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.current_session = Some(session.clone());
        write_key(&self.data_dir, CURRENT_SESSION_KEY, &data.current_session)
    }

    pub fn clear_current_exam_session(&self) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.current_session = None;
        write_key(&self.data_dir, CURRENT_SESSION_KEY, &data.current_session)
    }

    // --- login history ---

    /// Best-effort append; callers treat a `false` return as non-fatal.
    pub fn add_login_history(&self, user_id: &str, name: &str) -> bool {
        let mut data = self.data.write().expect("store lock poisoned");
        data.login_history.push(LoginHistoryEntry {
            user_id: user_id.to_string(),
            name: name.to_string(),
            logged_in_at: Utc::now(),
        });
        match write_key(&self.data_dir, LOGIN_HISTORY_KEY, &data.login_history) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist login history: {}", e);
                false
            }
        }
    }

    pub fn login_history(&self) -> Vec<LoginHistoryEntry> {
        self.data
            .read()
            .expect("store lock poisoned")
            .login_history
            .clone()
    }

    // --- wrong-answer book ---

    pub fn get_wrong_answers(&self) -> Vec<WrongAnswer> {
        self.data
            .read()
            .expect("store lock poisoned")
            .wrong_answers
            .clone()
    }

    pub fn add_wrong_answer(&self, question_id: u32) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        if data.wrong_answers.iter().any(|w| w.question_id == question_id) {
            return Ok(());
        }
        data.wrong_answers.push(WrongAnswer {
            question_id,
            recorded_at: Utc::now(),
        });
        write_key(&self.data_dir, WRONG_ANSWERS_KEY, &data.wrong_answers)
    }

    pub fn remove_wrong_answer(&self, question_id: u32) -> Result<()> {
        let mut data = self.data.write().expect("store lock poisoned");
        data.wrong_answers.retain(|w| w.question_id != question_id);
        write_key(&self.data_dir, WRONG_ANSWERS_KEY, &data.wrong_answers)
    }
}

fn key_path(data_dir: &Path, key: &str) -> PathBuf {
    data_dir.join(format!("{key}.json"))
}

fn read_key<T: DeserializeOwned>(data_dir: &Path, key: &str) -> Result<Option<T>> {
    let path = key_path(data_dir, key);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("Corrupt store file {}", path.display()))?;
    Ok(Some(value))
}

fn write_key<T: Serialize>(data_dir: &Path, key: &str, value: &T) -> Result<()> {
    let path = key_path(data_dir, key);
    let tmp = data_dir.join(format!(".{key}.json.tmp"));
    let raw = serde_json::to_string_pretty(value).context("Failed to serialize store value")?;
    fs::write(&tmp, raw).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
