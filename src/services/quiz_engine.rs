use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DEFAULT_BREAK_SECONDS, DEFAULT_COUNTDOWN_SECONDS};
use crate::error::{Error, Result};
use crate::models::answer::{Answer, AnswerSheet};
use crate::models::module::Module;
use crate::models::module_result::{ModuleResult, QuizSummary};
use crate::models::question::Question;
use crate::services::grading_service::GradingService;
use crate::services::question_bank::QuestionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Countdown,
    Active,
    Break,
    Finished,
}

impl Phase {
    pub fn accepts_start(self) -> bool {
        matches!(self, Phase::NotStarted | Phase::Finished)
    }

    /// The one timer that decrements in this phase.
    pub fn live_timer(self) -> Option<TimerKind> {
        match self {
            Phase::Countdown => Some(TimerKind::Countdown),
            Phase::Active => Some(TimerKind::Module),
            Phase::Break => Some(TimerKind::Break),
            Phase::NotStarted | Phase::Finished => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not-started",
            Phase::Countdown => "countdown",
            Phase::Active => "active",
            Phase::Break => "break",
            Phase::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Countdown,
    Module,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTimings {
    pub countdown_seconds: u32,
    pub break_seconds: u32,
}

impl Default for QuizTimings {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    pub phase: Phase,
    pub attempt_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub current_module_index: usize,
    pub current_question_index: usize,
    pub countdown_left: u32,
    pub time_left_in_module: u32,
    pub break_time_left: u32,
    /// Append-only, one entry per completed module in play order.
    pub module_results: Vec<ModuleResult>,
    pub answers: AnswerSheet,
    /// Set when the attempt ended early because module data was missing.
    pub aborted: bool,
}

impl Default for QuizState {
    fn default() -> Self {
        Self {
            phase: Phase::NotStarted,
            attempt_id: None,
            started_at: None,
            current_module_index: 0,
            current_question_index: 0,
            countdown_left: 0,
            time_left_in_module: 0,
            break_time_left: 0,
            module_results: Vec::new(),
            answers: AnswerSheet::new(),
            aborted: false,
        }
    }
}

impl QuizState {
    pub fn live_timer(&self) -> Option<TimerKind> {
        self.phase.live_timer()
    }

    pub fn summary(&self) -> Option<QuizSummary> {
        (self.phase == Phase::Finished).then(|| GradingService::summarize(&self.module_results))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserIntent {
    StartQuiz,
    SelectAnswer { question_id: String, option_id: String },
    NextQuestion,
    PrevQuestion,
    FinishModule,
    SkipBreak,
}

impl UserIntent {
    pub fn name(&self) -> &'static str {
        match self {
            UserIntent::StartQuiz => "start the quiz",
            UserIntent::SelectAnswer { .. } => "select an answer",
            UserIntent::NextQuestion => "go to the next question",
            UserIntent::PrevQuestion => "go to the previous question",
            UserIntent::FinishModule => "finish the module",
            UserIntent::SkipBreak => "skip the break",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    /// Issued once the attempt tracker has granted an attempt.
    Begin {
        attempt_id: Uuid,
        started_at: DateTime<Utc>,
    },
    Tick,
    Intent(UserIntent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    TimerStarted(TimerKind),
    TimerStopped(TimerKind),
    ModuleScored(ModuleResult),
    QuizFinished(QuizSummary),
    Aborted { module_index: usize },
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: QuizState,
    pub effects: Vec<Effect>,
}

/// Immutable quiz content plus the transition function over [`QuizState`].
#[derive(Debug, Clone)]
pub struct QuizEngine {
    quiz_id: String,
    modules: Vec<Module>,
    questions: HashMap<String, Vec<Question>>,
    timings: QuizTimings,
}

impl QuizEngine {
    pub fn new(source: &dyn QuestionSource, timings: QuizTimings) -> Self {
        let modules = source.modules();
        let questions = modules
            .iter()
            .filter_map(|m| source.questions(&m.topic).map(|qs| (m.topic.clone(), qs)))
            .collect();

        Self {
            quiz_id: source.quiz_id().to_string(),
            modules,
            questions,
            timings,
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn timings(&self) -> QuizTimings {
        self.timings
    }

    pub fn module(&self, index: usize) -> Result<&Module> {
        self.modules.get(index).ok_or(Error::MissingModuleData(index))
    }

    pub fn module_questions(&self, index: usize) -> Result<&[Question]> {
        let module = self.module(index)?;
        self.questions
            .get(&module.topic)
            .map(Vec::as_slice)
            .ok_or(Error::MissingModuleData(index))
    }

    pub fn initial_state(&self) -> QuizState {
        QuizState::default()
    }

    /// Pure transition: the input state is never mutated. A rejected event
    /// returns an error and the caller keeps its current state.
    pub fn step(&self, state: &QuizState, event: QuizEvent) -> Result<Transition> {
        let mut next = state.clone();
        let mut effects = Vec::new();

        match event {
            QuizEvent::Begin {
                attempt_id,
                started_at,
            } => {
                if !state.phase.accepts_start() {
                    return Err(rejected(&UserIntent::StartQuiz, state.phase));
                }
                next = QuizState {
                    phase: Phase::Countdown,
                    attempt_id: Some(attempt_id),
                    started_at: Some(started_at),
                    countdown_left: self.timings.countdown_seconds,
                    ..QuizState::default()
                };
                effects.push(Effect::TimerStarted(TimerKind::Countdown));
                if next.countdown_left == 0 {
                    self.end_countdown(&mut next, &mut effects);
                }
            }
            QuizEvent::Tick => self.on_tick(&mut next, &mut effects),
            QuizEvent::Intent(intent) => self.on_intent(&mut next, intent, &mut effects)?,
        }

        Ok(Transition {
            state: next,
            effects,
        })
    }

    fn on_tick(&self, state: &mut QuizState, effects: &mut Vec<Effect>) {
        match state.phase {
            Phase::Countdown => {
                state.countdown_left = state.countdown_left.saturating_sub(1);
                if state.countdown_left == 0 {
                    self.end_countdown(state, effects);
                }
            }
            Phase::Active => {
                state.time_left_in_module = state.time_left_in_module.saturating_sub(1);
                if state.time_left_in_module == 0 {
                    self.complete_module(state, effects);
                }
            }
            Phase::Break => {
                state.break_time_left = state.break_time_left.saturating_sub(1);
                if state.break_time_left == 0 {
                    self.leave_break(state, effects);
                }
            }
            // stray tick after the timer was stopped
            Phase::NotStarted | Phase::Finished => {}
        }
    }

    fn on_intent(
        &self,
        state: &mut QuizState,
        intent: UserIntent,
        effects: &mut Vec<Effect>,
    ) -> Result<()> {
        match intent {
            UserIntent::StartQuiz => Err(Error::InvalidIntent(
                "starting requires an attempt granted by the attempt tracker".to_string(),
            )),
            UserIntent::SelectAnswer {
                ref question_id,
                ref option_id,
            } => {
                require_phase(state, Phase::Active, &intent)?;
                let questions = self.module_questions(state.current_module_index)?;
                let question = questions
                    .iter()
                    .find(|q| &q.id == question_id)
                    .ok_or_else(|| {
                        Error::InvalidIntent(format!(
                            "question '{}' is not part of the current module",
                            question_id
                        ))
                    })?;
                if !question.has_option(option_id) {
                    return Err(Error::InvalidIntent(format!(
                        "option '{}' does not belong to question '{}'",
                        option_id, question_id
                    )));
                }
                let answer = Answer {
                    question_id: question_id.clone(),
                    selected_option: option_id.clone(),
                };
                if answer.record(&mut state.answers).is_some() {
                    tracing::debug!(question_id = %question_id, "Answer replaced");
                }
                Ok(())
            }
            UserIntent::NextQuestion => {
                require_phase(state, Phase::Active, &intent)?;
                let count = self.module_questions(state.current_module_index)?.len();
                if state.current_question_index + 1 < count {
                    state.current_question_index += 1;
                }
                Ok(())
            }
            UserIntent::PrevQuestion => {
                require_phase(state, Phase::Active, &intent)?;
                state.current_question_index = state.current_question_index.saturating_sub(1);
                Ok(())
            }
            UserIntent::FinishModule => {
                require_phase(state, Phase::Active, &intent)?;
                self.complete_module(state, effects);
                Ok(())
            }
            UserIntent::SkipBreak => {
                require_phase(state, Phase::Break, &intent)?;
                self.leave_break(state, effects);
                Ok(())
            }
        }
    }

    fn end_countdown(&self, state: &mut QuizState, effects: &mut Vec<Effect>) {
        state.countdown_left = 0;
        effects.push(Effect::TimerStopped(TimerKind::Countdown));
        self.enter_module(state, 0, effects);
    }

    fn leave_break(&self, state: &mut QuizState, effects: &mut Vec<Effect>) {
        state.break_time_left = 0;
        effects.push(Effect::TimerStopped(TimerKind::Break));
        let next = state.current_module_index + 1;
        self.enter_module(state, next, effects);
    }

    fn enter_module(&self, state: &mut QuizState, index: usize, effects: &mut Vec<Effect>) {
        let time = match (self.module(index), self.module_questions(index)) {
            (Ok(module), Ok(_)) => module.time,
            _ => return self.abort(state, index, effects),
        };

        state.phase = Phase::Active;
        state.current_module_index = index;
        state.current_question_index = 0;
        state.time_left_in_module = time;
        effects.push(Effect::TimerStarted(TimerKind::Module));
    }

    fn complete_module(&self, state: &mut QuizState, effects: &mut Vec<Effect>) {
        let index = state.current_module_index;
        let (module, questions) = match (self.module(index), self.module_questions(index)) {
            (Ok(module), Ok(questions)) => (module, questions),
            _ => {
                state.time_left_in_module = 0;
                effects.push(Effect::TimerStopped(TimerKind::Module));
                return self.abort(state, index, effects);
            }
        };

        let result = GradingService::grade_module(
            module,
            questions,
            &state.answers,
            state.time_left_in_module,
        );
        state.module_results.push(result.clone());
        state.time_left_in_module = 0;
        effects.push(Effect::TimerStopped(TimerKind::Module));
        effects.push(Effect::ModuleScored(result));

        if index + 1 >= self.modules.len() {
            return self.finish(state, effects);
        }

        if self.timings.break_seconds == 0 {
            self.enter_module(state, index + 1, effects);
        } else {
            state.phase = Phase::Break;
            state.break_time_left = self.timings.break_seconds;
            effects.push(Effect::TimerStarted(TimerKind::Break));
        }
    }

    fn abort(&self, state: &mut QuizState, index: usize, effects: &mut Vec<Effect>) {
        tracing::error!(
            quiz_id = %self.quiz_id,
            module_index = index,
            "Module data missing, ending attempt with accumulated results"
        );
        state.aborted = true;
        effects.push(Effect::Aborted {
            module_index: index,
        });
        self.finish(state, effects);
    }

    fn finish(&self, state: &mut QuizState, effects: &mut Vec<Effect>) {
        state.phase = Phase::Finished;
        state.countdown_left = 0;
        state.time_left_in_module = 0;
        state.break_time_left = 0;
        effects.push(Effect::QuizFinished(GradingService::summarize(
            &state.module_results,
        )));
    }
}

fn require_phase(state: &QuizState, expected: Phase, intent: &UserIntent) -> Result<()> {
    if state.phase == expected {
        Ok(())
    } else {
        Err(rejected(intent, state.phase))
    }
}

fn rejected(intent: &UserIntent, phase: Phase) -> Error {
    Error::InvalidIntent(format!("cannot {} while the quiz is {}", intent.name(), phase))
}
