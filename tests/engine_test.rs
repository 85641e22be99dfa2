mod common;

use chrono::Utc;
use eyecare_quiz::error::Error;
use eyecare_quiz::models::module::Module;
use eyecare_quiz::models::question::Question;
use eyecare_quiz::services::quiz_engine::{
    Effect, Phase, QuizEngine, QuizEvent, QuizState, QuizTimings, TimerKind, UserIntent,
};
use eyecare_quiz::services::question_bank::QuestionSource;
use uuid::Uuid;

use common::{engine, question, timings};

fn begin() -> QuizEvent {
    QuizEvent::Begin {
        attempt_id: Uuid::new_v4(),
        started_at: Utc::now(),
    }
}

fn intent(engine: &QuizEngine, state: &QuizState, intent: UserIntent) -> QuizState {
    engine
        .step(state, QuizEvent::Intent(intent))
        .expect("intent accepted")
        .state
}

fn ticks(engine: &QuizEngine, mut state: QuizState, n: u32) -> QuizState {
    for _ in 0..n {
        state = engine.step(&state, QuizEvent::Tick).unwrap().state;
    }
    state
}

fn answer(question_id: &str, option_id: &str) -> UserIntent {
    UserIntent::SelectAnswer {
        question_id: question_id.into(),
        option_id: option_id.into(),
    }
}

/// Started and past the countdown: module 0 is active.
fn active(engine: &QuizEngine) -> QuizState {
    let state = engine.step(&engine.initial_state(), begin()).unwrap().state;
    ticks(engine, state, 5)
}

#[test]
fn begin_enters_countdown_with_fresh_state() {
    let engine = engine();
    let transition = engine.step(&engine.initial_state(), begin()).unwrap();

    assert_eq!(transition.state.phase, Phase::Countdown);
    assert_eq!(transition.state.countdown_left, 5);
    assert!(transition.state.attempt_id.is_some());
    assert!(transition.state.module_results.is_empty());
    assert_eq!(transition.effects, vec![Effect::TimerStarted(TimerKind::Countdown)]);
}

#[test]
fn countdown_runs_five_ticks_then_starts_first_module() {
    let engine = engine();
    let mut state = engine.step(&engine.initial_state(), begin()).unwrap().state;

    state = ticks(&engine, state, 4);
    assert_eq!(state.phase, Phase::Countdown);
    assert_eq!(state.countdown_left, 1);

    let transition = engine.step(&state, QuizEvent::Tick).unwrap();
    assert_eq!(transition.state.phase, Phase::Active);
    assert_eq!(transition.state.current_module_index, 0);
    assert_eq!(transition.state.time_left_in_module, 420);
    assert_eq!(
        transition.effects,
        vec![
            Effect::TimerStopped(TimerKind::Countdown),
            Effect::TimerStarted(TimerKind::Module),
        ]
    );
}

#[test]
fn step_does_not_mutate_its_input() {
    let engine = engine();
    let before = active(&engine);
    let snapshot = before.clone();
    let _ = engine.step(&before, QuizEvent::Tick).unwrap();
    let _ = engine.step(&before, QuizEvent::Intent(answer("c1", "a"))).unwrap();
    assert_eq!(before, snapshot);
}

#[test]
fn selecting_again_overwrites_the_answer() {
    let engine = engine();
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "b"));
    state = intent(&engine, &state, answer("c1", "a"));

    assert_eq!(state.answers.len(), 1);
    assert_eq!(state.answers.get("c1").map(String::as_str), Some("a"));
}

#[test]
fn answers_outside_the_current_module_are_rejected() {
    let engine = engine();
    let state = active(&engine);

    let err = engine.step(&state, QuizEvent::Intent(answer("r1", "c"))).unwrap_err();
    assert!(matches!(err, Error::InvalidIntent(_)));

    let err = engine.step(&state, QuizEvent::Intent(answer("c1", "z"))).unwrap_err();
    assert!(matches!(err, Error::InvalidIntent(_)));
}

#[test]
fn navigation_is_clamped_and_keeps_the_timer() {
    let engine = engine();
    let mut state = ticks(&engine, active(&engine), 10);
    assert_eq!(state.time_left_in_module, 410);

    state = intent(&engine, &state, UserIntent::PrevQuestion);
    assert_eq!(state.current_question_index, 0);

    state = intent(&engine, &state, UserIntent::NextQuestion);
    state = intent(&engine, &state, UserIntent::NextQuestion);
    state = intent(&engine, &state, UserIntent::NextQuestion);
    assert_eq!(state.current_question_index, 1);
    assert_eq!(state.time_left_in_module, 410);

    state = intent(&engine, &state, UserIntent::PrevQuestion);
    assert_eq!(state.current_question_index, 0);
    assert_eq!(state.phase, Phase::Active);
}

#[test]
fn finishing_early_goes_to_break_then_skip_starts_next_module() {
    let engine = engine();
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "a"));
    state = intent(&engine, &state, answer("c2", "b"));
    state = intent(&engine, &state, UserIntent::NextQuestion);
    state = ticks(&engine, state, 20);

    let finished = engine
        .step(&state, QuizEvent::Intent(UserIntent::FinishModule))
        .unwrap();
    let state = finished.state;
    assert_eq!(state.phase, Phase::Break);
    assert_eq!(state.break_time_left, 120);
    assert_eq!(state.module_results.len(), 1);

    let result = &state.module_results[0];
    assert_eq!(result.topic, "Cornea");
    assert_eq!(result.time_taken, 20);
    assert_eq!(result.score, 10);
    assert_eq!(result.bonus_points, 48);
    assert!(finished
        .effects
        .contains(&Effect::ModuleScored(result.clone())));
    assert!(finished.effects.contains(&Effect::TimerStarted(TimerKind::Break)));

    let skipped = engine
        .step(&state, QuizEvent::Intent(UserIntent::SkipBreak))
        .unwrap()
        .state;
    assert_eq!(skipped.phase, Phase::Active);
    assert_eq!(skipped.current_module_index, 1);
    assert_eq!(skipped.current_question_index, 0);
    assert_eq!(skipped.time_left_in_module, 300);
    assert_eq!(skipped.break_time_left, 0);
}

#[test]
fn module_timer_expiry_scores_with_current_answers() {
    let engine = engine();
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "a"));

    state = ticks(&engine, state, 419);
    assert_eq!(state.phase, Phase::Active);
    assert_eq!(state.time_left_in_module, 1);

    state = ticks(&engine, state, 1);
    assert_eq!(state.phase, Phase::Break);
    let result = &state.module_results[0];
    assert_eq!(result.score, 5);
    assert_eq!(result.time_taken, 420);
    assert_eq!(result.bonus_points, 0);
    assert!(result.passed);
}

#[test]
fn break_timer_expiry_advances_to_next_module() {
    let engine = engine();
    let state = intent(&engine, &active(&engine), UserIntent::FinishModule);

    let state = ticks(&engine, state, 119);
    assert_eq!(state.phase, Phase::Break);
    assert_eq!(state.break_time_left, 1);

    let state = ticks(&engine, state, 1);
    assert_eq!(state.phase, Phase::Active);
    assert_eq!(state.current_module_index, 1);
    assert_eq!(state.time_left_in_module, 300);
}

#[test]
fn last_module_finishes_the_quiz_and_results_are_append_only() {
    let engine = engine();
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "a"));
    state = intent(&engine, &state, UserIntent::FinishModule);
    let first = state.module_results[0].clone();

    state = intent(&engine, &state, UserIntent::SkipBreak);
    state = intent(&engine, &state, answer("r1", "c"));
    let transition = engine
        .step(&state, QuizEvent::Intent(UserIntent::FinishModule))
        .unwrap();
    let state = transition.state;

    assert_eq!(state.phase, Phase::Finished);
    assert_eq!(state.module_results.len(), 2);
    assert_eq!(state.module_results[0], first);
    assert_eq!(state.live_timer(), None);

    let summary = state.summary().expect("summary once finished");
    assert_eq!(summary.total_score, 15);
    assert_eq!(summary.total_bonus, 80);
    assert_eq!(summary.final_score, 95);
    assert_eq!(summary.total_possible_points, 100);
    assert!(summary.overall_passed);
    assert!(transition.effects.contains(&Effect::QuizFinished(summary)));
}

#[test]
fn result_count_tracks_completed_modules() {
    let engine = engine();
    let mut state = active(&engine);
    assert_eq!(state.module_results.len(), 0);

    state = intent(&engine, &state, UserIntent::FinishModule);
    assert_eq!(state.module_results.len(), 1);
    state = intent(&engine, &state, UserIntent::SkipBreak);
    assert_eq!(state.module_results.len(), 1);
    state = ticks(&engine, state, 300);
    assert_eq!(state.module_results.len(), 2);
    assert_eq!(state.phase, Phase::Finished);
}

#[test]
fn only_one_timer_decrements_per_tick() {
    let engine = engine();
    let mut state = engine.step(&engine.initial_state(), begin()).unwrap().state;

    for _ in 0..1000 {
        let next = engine.step(&state, QuizEvent::Tick).unwrap().state;
        let moved = [
            next.countdown_left < state.countdown_left,
            next.time_left_in_module < state.time_left_in_module && next.phase == state.phase,
            next.break_time_left < state.break_time_left && next.phase == state.phase,
        ]
        .iter()
        .filter(|m| **m)
        .count();
        assert!(moved <= 1, "more than one timer moved: {:?} -> {:?}", state, next);

        match next.phase {
            Phase::Countdown => assert_eq!(next.live_timer(), Some(TimerKind::Countdown)),
            Phase::Active => {
                assert_eq!(next.live_timer(), Some(TimerKind::Module));
                assert_eq!(next.break_time_left, 0);
                assert_eq!(next.countdown_left, 0);
            }
            Phase::Break => {
                assert_eq!(next.live_timer(), Some(TimerKind::Break));
                assert_eq!(next.time_left_in_module, 0);
            }
            Phase::NotStarted | Phase::Finished => assert_eq!(next.live_timer(), None),
        }
        state = next;
    }
    assert_eq!(state.phase, Phase::Finished);
}

#[test]
fn intents_in_the_wrong_phase_are_rejected() {
    let engine = engine();
    let idle = engine.initial_state();

    for i in [
        UserIntent::FinishModule,
        UserIntent::SkipBreak,
        UserIntent::NextQuestion,
        answer("c1", "a"),
    ] {
        let err = engine.step(&idle, QuizEvent::Intent(i)).unwrap_err();
        assert!(matches!(err, Error::InvalidIntent(_)));
    }

    let running = active(&engine);
    assert!(engine.step(&running, begin()).is_err());
    assert!(engine
        .step(&running, QuizEvent::Intent(UserIntent::SkipBreak))
        .is_err());
    assert!(engine
        .step(&running, QuizEvent::Intent(UserIntent::StartQuiz))
        .is_err());
}

#[test]
fn ticks_outside_timed_phases_change_nothing() {
    let engine = engine();
    let idle = engine.initial_state();
    let transition = engine.step(&idle, QuizEvent::Tick).unwrap();
    assert_eq!(transition.state, idle);
    assert!(transition.effects.is_empty());
}

#[test]
fn retry_after_finish_resets_the_attempt() {
    let engine = engine();
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "a"));
    state = intent(&engine, &state, UserIntent::FinishModule);
    state = intent(&engine, &state, UserIntent::SkipBreak);
    state = intent(&engine, &state, UserIntent::FinishModule);
    assert_eq!(state.phase, Phase::Finished);

    let retried = engine.step(&state, begin()).unwrap().state;
    assert_eq!(retried.phase, Phase::Countdown);
    assert!(retried.answers.is_empty());
    assert!(retried.module_results.is_empty());
    assert_eq!(retried.current_module_index, 0);
    assert_ne!(retried.attempt_id, state.attempt_id);
}

#[test]
fn zero_break_goes_straight_to_next_module() {
    let engine = QuizEngine::new(
        &common::two_module_bank(),
        QuizTimings {
            countdown_seconds: 0,
            break_seconds: 0,
        },
    );
    let state = engine.step(&engine.initial_state(), begin()).unwrap().state;
    assert_eq!(state.phase, Phase::Active);

    let state = intent(&engine, &state, UserIntent::FinishModule);
    assert_eq!(state.phase, Phase::Active);
    assert_eq!(state.current_module_index, 1);
}

/// Source whose second module has no question list.
struct GappySource;

impl QuestionSource for GappySource {
    fn quiz_id(&self) -> &str {
        "gappy"
    }

    fn modules(&self) -> Vec<Module> {
        vec![common::cornea(), common::retina()]
    }

    fn questions(&self, topic: &str) -> Option<Vec<Question>> {
        (topic == "Cornea").then(|| vec![question("c1", "Cornea", "a", 5)])
    }
}

#[test]
fn missing_module_data_finishes_with_accumulated_results() {
    let engine = QuizEngine::new(&GappySource, timings());
    let mut state = active(&engine);
    state = intent(&engine, &state, answer("c1", "a"));
    state = intent(&engine, &state, UserIntent::FinishModule);

    let transition = engine
        .step(&state, QuizEvent::Intent(UserIntent::SkipBreak))
        .unwrap();
    assert_eq!(transition.state.phase, Phase::Finished);
    assert!(transition.state.aborted);
    assert_eq!(transition.state.module_results.len(), 1);
    assert!(transition
        .effects
        .contains(&Effect::Aborted { module_index: 1 }));
    assert_eq!(transition.state.live_timer(), None);
}

#[test]
fn aborting_an_active_module_stops_its_timer() {
    let engine = engine();
    // active on a module index the bank does not have
    let state = QuizState {
        phase: Phase::Active,
        current_module_index: 5,
        time_left_in_module: 30,
        ..QuizState::default()
    };

    let transition = engine
        .step(&state, QuizEvent::Intent(UserIntent::FinishModule))
        .unwrap();
    assert_eq!(transition.state.phase, Phase::Finished);
    assert!(transition.state.aborted);
    assert_eq!(transition.state.time_left_in_module, 0);
    assert_eq!(
        transition.effects[0],
        Effect::TimerStopped(TimerKind::Module)
    );
    assert!(transition
        .effects
        .contains(&Effect::Aborted { module_index: 5 }));

    let expired = QuizState {
        time_left_in_module: 1,
        ..state
    };
    let transition = engine.step(&expired, QuizEvent::Tick).unwrap();
    assert_eq!(transition.state.phase, Phase::Finished);
    assert!(transition
        .effects
        .contains(&Effect::TimerStopped(TimerKind::Module)));
}

struct EmptySource;

impl QuestionSource for EmptySource {
    fn quiz_id(&self) -> &str {
        "empty"
    }

    fn modules(&self) -> Vec<Module> {
        Vec::new()
    }

    fn questions(&self, _topic: &str) -> Option<Vec<Question>> {
        None
    }
}

#[test]
fn quiz_without_modules_finishes_after_countdown() {
    let engine = QuizEngine::new(&EmptySource, timings());
    let state = active(&engine);
    assert_eq!(state.phase, Phase::Finished);
    assert!(state.aborted);
    let summary = state.summary().unwrap();
    assert_eq!(summary.modules_completed, 0);
    assert!(!summary.overall_passed);
}
