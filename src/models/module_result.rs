use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub topic: String,
    pub score: u32,
    /// Number of questions in the module.
    pub total: usize,
    pub time_taken: u32,
    pub total_time: u32,
    pub passed: bool,
    pub total_points: u32,
    pub bonus_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub total_score: u32,
    pub total_bonus: u32,
    pub final_score: u32,
    pub total_possible_points: u32,
    /// 0-100 scale.
    pub overall_percentage: f64,
    pub overall_passed: bool,
    pub total_time_taken: u32,
    pub modules_completed: usize,
}
