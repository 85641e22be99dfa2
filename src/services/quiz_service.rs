use std::sync::Arc;

use uuid::Uuid;

use crate::dto::quiz_dto::{ModuleSummary, QuestionView, QuizResultsResponse, QuizView};
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::services::attempt_service::AttemptService;
use crate::services::grading_service::GradingService;
use crate::services::quiz_engine::{
    Effect, Phase, QuizEngine, QuizEvent, QuizState, TimerKind, UserIntent,
};
use crate::utils::time::{format_clock, now};

/// Owns one quiz's state and routes inbound intents and ticks through the engine.
pub struct QuizService {
    engine: Arc<QuizEngine>,
    attempts: AttemptService,
    state: QuizState,
}

impl QuizService {
    pub fn new(engine: Arc<QuizEngine>, attempts: AttemptService) -> Self {
        let state = engine.initial_state();
        Self {
            engine,
            attempts,
            state,
        }
    }

    pub fn quiz_id(&self) -> &str {
        self.engine.quiz_id()
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn live_timer(&self) -> Option<TimerKind> {
        self.state.live_timer()
    }

    pub fn handle(&mut self, intent: UserIntent) -> Result<Vec<Effect>> {
        match intent {
            UserIntent::StartQuiz => self.start(),
            other => self.apply(QuizEvent::Intent(other)),
        }
    }

    /// The phase is checked before the tracker so a rejected start never
    /// consumes an attempt.
    pub fn start(&mut self) -> Result<Vec<Effect>> {
        if !self.state.phase.accepts_start() {
            return Err(Error::InvalidIntent(format!(
                "cannot start the quiz while it is {}",
                self.state.phase
            )));
        }

        let session = self.attempts.start(self.engine.quiz_id())?;
        let attempt_id = Uuid::new_v4();
        tracing::info!(
            quiz_id = %self.engine.quiz_id(),
            %attempt_id,
            attempts_left = session.attempts_left,
            "Quiz attempt started"
        );

        self.apply(QuizEvent::Begin {
            attempt_id,
            started_at: now(),
        })
    }

    pub fn tick(&mut self) -> Vec<Effect> {
        match self.apply(QuizEvent::Tick) {
            Ok(effects) => effects,
            Err(e) => {
                tracing::error!(error = ?e, "Tick rejected");
                Vec::new()
            }
        }
    }

    fn apply(&mut self, event: QuizEvent) -> Result<Vec<Effect>> {
        let transition = self.engine.step(&self.state, event)?;
        self.state = transition.state;
        self.log_effects(&transition.effects);
        Ok(transition.effects)
    }

    fn log_effects(&self, effects: &[Effect]) {
        let quiz_id = self.engine.quiz_id();
        for effect in effects {
            match effect {
                Effect::TimerStarted(kind) => {
                    tracing::debug!(quiz_id, timer = ?kind, "Timer started")
                }
                Effect::TimerStopped(kind) => {
                    tracing::debug!(quiz_id, timer = ?kind, "Timer stopped")
                }
                Effect::ModuleScored(result) => tracing::info!(
                    quiz_id,
                    topic = %result.topic,
                    score = result.score,
                    total_points = result.total_points,
                    bonus_points = result.bonus_points,
                    time_taken = result.time_taken,
                    passed = result.passed,
                    "Module scored"
                ),
                Effect::QuizFinished(summary) => tracing::info!(
                    quiz_id,
                    attempt_id = ?self.state.attempt_id,
                    final_score = summary.final_score,
                    total_possible_points = summary.total_possible_points,
                    passed = summary.overall_passed,
                    "Quiz finished"
                ),
                Effect::Aborted { module_index } => {
                    tracing::warn!(quiz_id, module_index, "Quiz attempt aborted")
                }
            }
        }
    }

    fn attempts_left(&self) -> Result<Option<u32>> {
        Ok(self
            .attempts
            .load(self.engine.quiz_id())?
            .map(|s| s.display_attempts_left()))
    }

    pub fn module_summary(&self, index: usize) -> Option<ModuleSummary> {
        let module = self.engine.module(index).ok()?;
        let question_count = self.engine.module_questions(index).map(|qs| qs.len()).unwrap_or(0);
        Some(ModuleSummary {
            topic: module.topic.clone(),
            time: module.time,
            time_bonus: module.time_bonus,
            question_count,
        })
    }

    fn current_question(&self) -> Option<QuestionView> {
        if self.state.phase != Phase::Active {
            return None;
        }
        let questions = self
            .engine
            .module_questions(self.state.current_module_index)
            .ok()?;
        let q = questions.get(self.state.current_question_index)?;
        Some(QuestionView {
            id: q.id.clone(),
            text: q.text.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty,
            points: q.points,
            selected_option: self.state.answers.get(&q.id).cloned(),
        })
    }

    /// A failing session read leaves `attempts_left` unset.
    pub fn view(&self) -> QuizView {
        let state = &self.state;
        let attempts_left = self.attempts_left().unwrap_or_else(|e| {
            tracing::warn!(quiz_id = %self.engine.quiz_id(), error = %e, "Could not read attempts left");
            None
        });
        let current_module = match state.phase {
            Phase::Countdown | Phase::Active | Phase::Break => {
                self.module_summary(state.current_module_index)
            }
            Phase::NotStarted | Phase::Finished => None,
        };

        QuizView {
            quiz_id: self.engine.quiz_id().to_string(),
            state: state.phase,
            attempt_id: state.attempt_id,
            started_at: state.started_at,
            current_module_index: state.current_module_index,
            current_module,
            module_count: self.engine.modules().len(),
            current_question_index: state.current_question_index,
            current_question: self.current_question(),
            countdown_left: state.countdown_left,
            time_left_in_module: state.time_left_in_module,
            time_left_display: format_clock(state.time_left_in_module),
            break_time_left: state.break_time_left,
            break_time_display: format_clock(state.break_time_left),
            module_results: state.module_results.clone(),
            answers: state.answers.clone(),
            attempts_left,
            can_start: state.phase.accepts_start() && attempts_left.unwrap_or(0) > 0,
            summary: state.summary(),
        }
    }

    /// Questions of the modules completed in this attempt, in play order.
    fn played_questions(&self) -> Vec<Question> {
        (0..self.state.module_results.len())
            .filter_map(|index| self.engine.module_questions(index).ok())
            .flatten()
            .cloned()
            .collect()
    }

    pub fn results(&self) -> Result<QuizResultsResponse> {
        let summary = self.state.summary().ok_or_else(|| {
            Error::InvalidIntent(format!(
                "results are available once the quiz is finished (currently {})",
                self.state.phase
            ))
        })?;

        Ok(QuizResultsResponse {
            quiz_id: self.engine.quiz_id().to_string(),
            attempt_id: self.state.attempt_id,
            aborted: self.state.aborted,
            summary,
            module_results: self.state.module_results.clone(),
            review: GradingService::review(&self.played_questions(), &self.state.answers),
            attempts_left: self.attempts_left()?,
        })
    }
}
