use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub selected_option: String,
}

impl Answer {
    /// Records the selection, returning the option it replaced, if any.
    pub fn record(self, sheet: &mut AnswerSheet) -> Option<String> {
        sheet.insert(self.question_id, self.selected_option)
    }
}

/// Recorded answers keyed by question id. A later selection for the same
/// question replaces the earlier one.
pub type AnswerSheet = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub module: String,
    pub question_text: String,
    pub selected_option: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points_earned: u32,
    pub max_points: u32,
}
