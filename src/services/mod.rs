pub mod attempt_service;
pub mod grading_service;
pub mod question_bank;
pub mod quiz_engine;
pub mod quiz_runtime;
pub mod quiz_service;
pub mod session_store;
