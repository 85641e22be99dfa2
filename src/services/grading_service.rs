use crate::models::answer::{AnswerSheet, GradedAnswer};
use crate::models::module::Module;
use crate::models::module_result::{ModuleResult, QuizSummary};
use crate::models::question::Question;

pub struct GradingService;

impl GradingService {
    /// Scores one module at the moment it ends. Unanswered questions earn nothing.
    pub fn grade_module(
        module: &Module,
        questions: &[Question],
        answers: &AnswerSheet,
        time_left: u32,
    ) -> ModuleResult {
        let mut total_points: u32 = 0;
        let mut score: u32 = 0;

        for q in questions {
            total_points = total_points.saturating_add(q.points);
            let correct = answers
                .get(&q.id)
                .map(|selected| q.is_correct(selected))
                .unwrap_or(false);
            if correct {
                score = score.saturating_add(q.points);
            }
        }

        let time_taken = module.time.saturating_sub(time_left.min(module.time));
        let bonus_points = Self::time_bonus(module, time_taken);
        let passed = total_points > 0 && at_least_half(score, total_points);

        ModuleResult {
            topic: module.topic.clone(),
            score,
            total: questions.len(),
            time_taken,
            total_time: module.time,
            passed,
            total_points,
            bonus_points,
        }
    }

    pub fn time_bonus(module: &Module, time_taken: u32) -> u32 {
        if module.time == 0 || time_taken >= module.time {
            return 0;
        }
        let time_ratio = ((module.time - time_taken) as f64 / module.time as f64).max(0.0);
        (module.time_bonus as f64 * time_ratio).round() as u32
    }

    /// Bonus points count toward both the final score and the possible points,
    /// so a fast finish can lift the overall ratio even with weak answers.
    pub fn summarize(results: &[ModuleResult]) -> QuizSummary {
        let total_score = saturating_sum(results.iter().map(|r| r.score));
        let total_bonus = saturating_sum(results.iter().map(|r| r.bonus_points));
        let final_score = total_score.saturating_add(total_bonus);
        let total_possible_points = saturating_sum(
            results
                .iter()
                .map(|r| r.total_points.saturating_add(r.bonus_points)),
        );
        let total_time_taken = saturating_sum(results.iter().map(|r| r.time_taken));

        let overall_percentage = if total_possible_points > 0 {
            (final_score as f64 / total_possible_points as f64) * 100.0
        } else {
            0.0
        };
        let overall_passed =
            total_possible_points > 0 && at_least_half(final_score, total_possible_points);

        QuizSummary {
            total_score,
            total_bonus,
            final_score,
            total_possible_points,
            overall_percentage,
            overall_passed,
            total_time_taken,
            modules_completed: results.len(),
        }
    }

    pub fn review(questions: &[Question], answers: &AnswerSheet) -> Vec<GradedAnswer> {
        questions
            .iter()
            .map(|q| {
                let selected = answers.get(&q.id).cloned();
                let is_correct = selected.as_deref().map(|s| q.is_correct(s)).unwrap_or(false);
                GradedAnswer {
                    question_id: q.id.clone(),
                    module: q.module.clone(),
                    question_text: q.text.clone(),
                    selected_option: selected,
                    correct_answer: q.correct_answer.clone(),
                    is_correct,
                    points_earned: if is_correct { q.points } else { 0 },
                    max_points: q.points,
                }
            })
            .collect()
    }
}

/// `part / whole >= 0.5`, evaluated without overflow.
fn at_least_half(part: u32, whole: u32) -> bool {
    u64::from(part) * 2 >= u64::from(whole)
}

fn saturating_sum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}
