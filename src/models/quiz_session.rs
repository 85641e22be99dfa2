use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub membership_id: String,
    pub attempts_left: i32,
}

impl QuizSession {
    pub fn new(membership_id: impl Into<String>, attempts_left: i32) -> Self {
        Self {
            membership_id: membership_id.into(),
            attempts_left,
        }
    }

    pub fn can_start(&self) -> bool {
        self.attempts_left > 0
    }

    pub fn display_attempts_left(&self) -> u32 {
        self.attempts_left.max(0) as u32
    }
}
