use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::quiz_dto::{
    ModuleSummary, QuizOverview, RegisterSessionRequest, RegisterSessionResponse,
    SelectAnswerRequest,
};
use crate::services::quiz_engine::UserIntent;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    state.ensure_quiz(&quiz_id)?;
    let bank = &state.bank;
    let timings = state.engine.timings();
    let session = state.attempt_service.load(&quiz_id)?;

    let modules: Vec<ModuleSummary> = bank
        .modules
        .iter()
        .map(|m| ModuleSummary {
            topic: m.topic.clone(),
            time: m.time,
            time_bonus: m.time_bonus,
            question_count: bank.question_count(&m.topic),
        })
        .collect();

    let response = QuizOverview {
        quiz_id: bank.quiz_id.clone(),
        title: bank.title.clone(),
        total_questions: bank.questions.len(),
        modules,
        countdown_seconds: timings.countdown_seconds,
        break_seconds: timings.break_seconds,
        max_attempts: state.attempt_service.max_attempts().max(0) as u32,
        attempts_left: session.map(|s| s.display_attempts_left()),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn register_session(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    Json(req): Json<RegisterSessionRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state.ensure_quiz(&quiz_id)?;
    let session = state.attempt_service.register(&quiz_id, &req.membership_id)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterSessionResponse {
            quiz_id,
            membership_id: session.membership_id.clone(),
            attempts_left: session.display_attempts_left(),
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_state(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    let runtime = state.runtime(&quiz_id).await?;
    Ok(Json(runtime.view().await?).into_response())
}

#[axum::debug_handler]
pub async fn start_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    tracing::info!("Start requested for quiz: {}", quiz_id);
    dispatch(&state, &quiz_id, UserIntent::StartQuiz).await
}

#[axum::debug_handler]
pub async fn select_answer(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    Json(req): Json<SelectAnswerRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let intent = UserIntent::SelectAnswer {
        question_id: req.question_id,
        option_id: req.option_id,
    };
    dispatch(&state, &quiz_id, intent).await
}

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    dispatch(&state, &quiz_id, UserIntent::NextQuestion).await
}

#[axum::debug_handler]
pub async fn prev_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    dispatch(&state, &quiz_id, UserIntent::PrevQuestion).await
}

#[axum::debug_handler]
pub async fn finish_module(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    dispatch(&state, &quiz_id, UserIntent::FinishModule).await
}

#[axum::debug_handler]
pub async fn skip_break(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    dispatch(&state, &quiz_id, UserIntent::SkipBreak).await
}

#[axum::debug_handler]
pub async fn get_results(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    let runtime = state.runtime(&quiz_id).await?;
    Ok(Json(runtime.results().await?).into_response())
}

#[axum::debug_handler]
pub async fn leave_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> crate::error::Result<Response> {
    let torn_down = state.leave(&quiz_id).await?;
    Ok(Json(json!({ "quiz_id": quiz_id, "torn_down": torn_down })).into_response())
}

async fn dispatch(
    state: &AppState,
    quiz_id: &str,
    intent: UserIntent,
) -> crate::error::Result<Response> {
    let runtime = state.runtime(quiz_id).await?;
    match runtime.dispatch(intent.clone()).await {
        Ok(view) => Ok(Json(view).into_response()),
        Err(e) => {
            tracing::warn!(quiz_id, intent = ?intent, error = %e, "Intent rejected");
            Err(e)
        }
    }
}
