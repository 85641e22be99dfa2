pub mod health;
pub mod quiz;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let quiz_api = Router::new()
        .route("/api/quizzes/:quiz_id", get(quiz::get_quiz))
        .route("/api/quizzes/:quiz_id/session", post(quiz::register_session))
        .route("/api/quizzes/:quiz_id/state", get(quiz::get_state))
        .route("/api/quizzes/:quiz_id/start", post(quiz::start_quiz))
        .route("/api/quizzes/:quiz_id/answer", post(quiz::select_answer))
        .route("/api/quizzes/:quiz_id/next", post(quiz::next_question))
        .route("/api/quizzes/:quiz_id/prev", post(quiz::prev_question))
        .route("/api/quizzes/:quiz_id/finish-module", post(quiz::finish_module))
        .route("/api/quizzes/:quiz_id/skip-break", post(quiz::skip_break))
        .route("/api/quizzes/:quiz_id/results", get(quiz::get_results))
        .route("/api/quizzes/:quiz_id/leave", post(quiz::leave_quiz));

    Router::new()
        .route("/health", get(health::health))
        .merge(quiz_api)
        .with_state(state)
}
