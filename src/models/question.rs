use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1))]
    pub id: String,
    /// Topic of the module this question belongs to.
    #[validate(length(min = 1))]
    pub module: String,
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(length(min = 2), nested)]
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_points")]
    #[validate(range(max = 10_000))]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

impl Question {
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_answer == option_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizOption {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}
