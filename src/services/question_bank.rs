use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::module::Module;
use crate::models::question::Question;

const BUNDLED_BANK: &str = include_str!("../../data/question_bank.json");

/// Read-only provider of quiz content.
pub trait QuestionSource: Send + Sync {
    fn quiz_id(&self) -> &str;

    /// Modules in play order.
    fn modules(&self) -> Vec<Module>;

    /// Questions of one module in display order, `None` when the topic is unknown.
    fn questions(&self, topic: &str) -> Option<Vec<Question>>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionBank {
    #[validate(length(min = 1))]
    pub quiz_id: String,
    pub title: String,
    #[validate(nested)]
    pub modules: Vec<Module>,
    #[validate(nested)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_BANK)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Loading question bank");
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let bank: QuestionBank = serde_json::from_str(raw)?;
        bank.validate()?;
        bank.check_integrity()?;
        Ok(bank)
    }

    pub fn question_count(&self, topic: &str) -> usize {
        self.questions.iter().filter(|q| q.module == topic).count()
    }

    fn check_integrity(&self) -> Result<()> {
        let mut topics = HashSet::new();
        for module in &self.modules {
            if !topics.insert(module.topic.as_str()) {
                return Err(Error::InvalidQuestionBank(format!(
                    "duplicate module topic '{}'",
                    module.topic
                )));
            }
        }

        let mut ids = HashSet::new();
        for q in &self.questions {
            if !ids.insert(q.id.as_str()) {
                return Err(Error::InvalidQuestionBank(format!(
                    "duplicate question id '{}'",
                    q.id
                )));
            }
            if !topics.contains(q.module.as_str()) {
                return Err(Error::InvalidQuestionBank(format!(
                    "question '{}' references unknown module '{}'",
                    q.id, q.module
                )));
            }
            let mut option_ids = HashSet::new();
            if q.options.iter().any(|o| !option_ids.insert(o.id.as_str())) {
                return Err(Error::InvalidQuestionBank(format!(
                    "question '{}' has duplicate option ids",
                    q.id
                )));
            }
            if !q.has_option(&q.correct_answer) {
                return Err(Error::InvalidQuestionBank(format!(
                    "question '{}' has correct answer '{}' that is not one of its options",
                    q.id, q.correct_answer
                )));
            }
        }
        Ok(())
    }
}

impl QuestionSource for QuestionBank {
    fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    fn modules(&self) -> Vec<Module> {
        self.modules.clone()
    }

    fn questions(&self, topic: &str) -> Option<Vec<Question>> {
        if !self.modules.iter().any(|m| m.topic == topic) {
            return None;
        }
        Some(
            self.questions
                .iter()
                .filter(|q| q.module == topic)
                .cloned()
                .collect(),
        )
    }
}
