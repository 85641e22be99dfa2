use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::answer::{AnswerSheet, GradedAnswer};
use crate::models::module_result::{ModuleResult, QuizSummary};
use crate::models::question::{Difficulty, QuizOption};
use crate::services::quiz_engine::Phase;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSessionRequest {
    #[validate(length(min = 1, max = 128))]
    pub membership_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSessionResponse {
    pub quiz_id: String,
    pub membership_id: String,
    pub attempts_left: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SelectAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[validate(length(min = 1))]
    pub option_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub topic: String,
    pub time: u32,
    pub time_bonus: u32,
    pub question_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOverview {
    pub quiz_id: String,
    pub title: String,
    pub modules: Vec<ModuleSummary>,
    pub total_questions: usize,
    pub countdown_seconds: u32,
    pub break_seconds: u32,
    pub max_attempts: u32,
    pub attempts_left: Option<u32>,
}

/// A question as shown while the module runs; the correct answer stays hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub options: Vec<QuizOption>,
    pub difficulty: Difficulty,
    pub points: u32,
    pub selected_option: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizView {
    pub quiz_id: String,
    pub state: Phase,
    pub attempt_id: Option<Uuid>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub current_module_index: usize,
    pub current_module: Option<ModuleSummary>,
    pub module_count: usize,
    pub current_question_index: usize,
    pub current_question: Option<QuestionView>,
    pub countdown_left: u32,
    pub time_left_in_module: u32,
    pub time_left_display: String,
    pub break_time_left: u32,
    pub break_time_display: String,
    pub module_results: Vec<ModuleResult>,
    pub answers: AnswerSheet,
    pub attempts_left: Option<u32>,
    pub can_start: bool,
    pub summary: Option<QuizSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultsResponse {
    pub quiz_id: String,
    pub attempt_id: Option<Uuid>,
    pub aborted: bool,
    pub summary: QuizSummary,
    pub module_results: Vec<ModuleResult>,
    pub review: Vec<GradedAnswer>,
    pub attempts_left: Option<u32>,
}
