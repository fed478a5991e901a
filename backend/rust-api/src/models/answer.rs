use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::assessment::Assessment;
use super::attempt::AttemptState;

/// One tagged answer entry as transmitted at finalize.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerSelection {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[validate(length(min = 1))]
    pub alternative_id: String,
}

/// The student's current choices while an attempt is in progress: at most one
/// selected alternative per question, selections replace rather than append,
/// and nothing mutates once the attempt is terminal.
///
/// The finalize service folds the submitted payload through the same `select`
/// rules, so client and server agree on what a valid selection is.
pub struct AnswerLedger<'a> {
    assessment: &'a Assessment,
    open: bool,
    selected: HashMap<String, String>,
}

impl<'a> AnswerLedger<'a> {
    pub fn new(assessment: &'a Assessment, state: AttemptState) -> Self {
        Self {
            assessment,
            open: state == AttemptState::InProgress,
            selected: HashMap::new(),
        }
    }

    /// Records a selection. Returns false (and records nothing) when the
    /// attempt is not in progress or the pair is not part of the assessment.
    pub fn select(&mut self, question_id: &str, alternative_id: &str) -> bool {
        if !self.open {
            return false;
        }
        let Some(question) = self.assessment.question(question_id) else {
            return false;
        };
        if question.alternative(alternative_id).is_none() {
            return false;
        }
        self.selected
            .insert(question_id.to_string(), alternative_id.to_string());
        true
    }

    /// The full question -> alternative map at this instant. Consumes the
    /// ledger: once a snapshot is handed to finalize there is nothing left to
    /// mutate.
    pub fn snapshot(self) -> HashMap<String, String> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{Alternative, Question};
    use chrono::{Duration, Utc};

    fn assessment() -> Assessment {
        Assessment {
            id: "sim-1".to_string(),
            title: "Simulado".to_string(),
            class_ids: vec!["turma-a".to_string()],
            duration_seconds: 600,
            opens_at: Utc::now() - Duration::hours(1),
            closes_at: Utc::now() + Duration::hours(1),
            active: true,
            questions: vec![Question {
                id: "q1".to_string(),
                prompt: "prompt".to_string(),
                value: 5.0,
                alternatives: vec![
                    Alternative {
                        id: "q1-a".to_string(),
                        label: "A".to_string(),
                        text: "first".to_string(),
                        is_correct: true,
                    },
                    Alternative {
                        id: "q1-b".to_string(),
                        label: "B".to_string(),
                        text: "second".to_string(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    #[test]
    fn selecting_again_replaces_never_appends() {
        let assessment = assessment();
        let mut ledger = AnswerLedger::new(&assessment, AttemptState::InProgress);

        assert!(ledger.select("q1", "q1-b"));
        assert!(ledger.select("q1", "q1-a"));

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("q1").map(String::as_str), Some("q1-a"));
    }

    #[test]
    fn unknown_pairs_are_ignored() {
        let assessment = assessment();
        let mut ledger = AnswerLedger::new(&assessment, AttemptState::InProgress);

        assert!(!ledger.select("q9", "q1-a"));
        assert!(!ledger.select("q1", "q2-a"));
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn terminal_attempt_accepts_nothing() {
        let assessment = assessment();
        for state in [AttemptState::Submitted, AttemptState::Expired] {
            let mut ledger = AnswerLedger::new(&assessment, state);
            assert!(!ledger.select("q1", "q1-a"));
            assert!(ledger.snapshot().is_empty());
        }
    }
}
