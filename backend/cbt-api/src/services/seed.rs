use anyhow::{Context, Result};

use crate::models::Question;
use crate::storage::LocalStore;

/// Default question bank, embedded so a fresh data dir is usable immediately.
const QUESTION_BANK: &str = include_str!("../../seed/questions.json");

/// Seeds the question bank when the store has none. Members are not seeded;
/// they come in through registration.
pub fn ensure_seed_data(store: &LocalStore) -> Result<()> {
    if !store.question_bank().is_empty() {
        return Ok(());
    }

    let questions: Vec<Question> =
        serde_json::from_str(QUESTION_BANK).context("Embedded question bank is invalid")?;
    let count = questions.len();
    store.replace_question_bank(questions)?;
    tracing::info!("Seeded question bank with {} questions", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_bank_parses_and_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        ensure_seed_data(&store).unwrap();
        let bank = store.question_bank();
        assert!(!bank.is_empty());
        for q in &bank {
            assert!(q.answer < q.choices.len());
        }

        // A second call must not duplicate the bank.
        ensure_seed_data(&store).unwrap();
        assert_eq!(store.question_bank().len(), bank.len());
    }
}
