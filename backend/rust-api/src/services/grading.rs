use std::collections::HashMap;

use crate::error::EngineError;
use crate::models::answer::{AnswerLedger, AnswerSelection};
use crate::models::assessment::Assessment;
use crate::models::attempt::AttemptState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingOutcome {
    pub score: f64,
    pub answered: usize,
    pub correct: usize,
}

/// Folds a finalize payload into the canonical question -> alternative map.
///
/// Duplicate entries for a question follow the ledger's replacement
/// semantics (the last one wins). An entry the ledger will not accept —
/// an id outside the assessment's question/alternative sets — rejects the
/// whole payload instead of being silently stored.
pub fn collect_snapshot(
    assessment: &Assessment,
    selections: &[AnswerSelection],
) -> Result<HashMap<String, String>, EngineError> {
    let mut ledger = AnswerLedger::new(assessment, AttemptState::InProgress);
    for selection in selections {
        if !ledger.select(&selection.question_id, &selection.alternative_id) {
            return Err(EngineError::Validation(format!(
                "unknown question/alternative pair: {}/{}",
                selection.question_id, selection.alternative_id
            )));
        }
    }
    Ok(ledger.snapshot())
}

/// Full credit per correctly answered question, zero otherwise; unanswered
/// questions contribute zero. The sum keeps full f64 precision.
pub fn grade(assessment: &Assessment, answers: &HashMap<String, String>) -> GradingOutcome {
    let mut outcome = GradingOutcome {
        score: 0.0,
        answered: 0,
        correct: 0,
    };
    for question in &assessment.questions {
        let Some(alternative_id) = answers.get(&question.id) else {
            continue;
        };
        outcome.answered += 1;
        let is_correct = question
            .alternative(alternative_id)
            .is_some_and(|a| a.is_correct);
        if is_correct {
            outcome.correct += 1;
            outcome.score += question.value;
        }
    }
    outcome
}
