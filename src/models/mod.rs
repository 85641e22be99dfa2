pub mod answer;
pub mod module;
pub mod module_result;
pub mod question;
pub mod quiz_session;
