#![allow(dead_code)]

use std::sync::Arc;

use eyecare_quiz::models::module::Module;
use eyecare_quiz::models::question::{Difficulty, Question, QuizOption};
use eyecare_quiz::services::attempt_service::AttemptService;
use eyecare_quiz::services::question_bank::QuestionBank;
use eyecare_quiz::services::quiz_engine::{QuizEngine, QuizTimings};
use eyecare_quiz::services::quiz_service::QuizService;
use eyecare_quiz::services::session_store::{session_key, InMemorySessionStore, SessionStore};
use eyecare_quiz::models::quiz_session::QuizSession;

pub const QUIZ_ID: &str = "test-quiz";

pub fn question(id: &str, module: &str, correct: &str, points: u32) -> Question {
    Question {
        id: id.to_string(),
        module: module.to_string(),
        text: format!("Question {}", id),
        options: vec![
            QuizOption {
                id: "a".into(),
                text: "Option A".into(),
            },
            QuizOption {
                id: "b".into(),
                text: "Option B".into(),
            },
            QuizOption {
                id: "c".into(),
                text: "Option C".into(),
            },
        ],
        correct_answer: correct.to_string(),
        difficulty: Difficulty::Medium,
        points,
    }
}

pub fn cornea() -> Module {
    Module {
        topic: "Cornea".into(),
        time: 420,
        time_bonus: 50,
    }
}

pub fn retina() -> Module {
    Module {
        topic: "Retina".into(),
        time: 300,
        time_bonus: 30,
    }
}

/// Two modules: Cornea (c1, c2 worth 5 each) and Retina (r1 worth 10).
pub fn two_module_bank() -> QuestionBank {
    QuestionBank {
        quiz_id: QUIZ_ID.into(),
        title: "Test Quiz".into(),
        modules: vec![cornea(), retina()],
        questions: vec![
            question("c1", "Cornea", "a", 5),
            question("c2", "Cornea", "b", 5),
            question("r1", "Retina", "c", 10),
        ],
    }
}

pub fn timings() -> QuizTimings {
    QuizTimings {
        countdown_seconds: 5,
        break_seconds: 120,
    }
}

pub fn engine() -> Arc<QuizEngine> {
    Arc::new(QuizEngine::new(&two_module_bank(), timings()))
}

pub fn store_with_attempts(attempts_left: i32) -> Arc<InMemorySessionStore> {
    let store = Arc::new(InMemorySessionStore::new());
    store
        .set(&session_key(QUIZ_ID), &QuizSession::new("member-1", attempts_left))
        .expect("seed session");
    store
}

pub fn service_with_attempts(attempts_left: i32) -> (QuizService, Arc<InMemorySessionStore>) {
    let store = store_with_attempts(attempts_left);
    let attempts = AttemptService::new(store.clone(), 3);
    (QuizService::new(engine(), attempts), store)
}
