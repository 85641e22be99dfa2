use serde::{Deserialize, Serialize};
use validator::Validate;

/// A themed, time-boxed block of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Module {
    #[validate(length(min = 1))]
    pub topic: String,
    /// Allotted time in seconds.
    #[validate(range(max = 86_400))]
    pub time: u32,
    /// Maximum bonus for finishing instantly.
    #[validate(range(max = 10_000))]
    pub time_bonus: u32,
}
