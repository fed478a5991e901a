use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::answer::AnswerSelection;
use super::assessment::Assessment;
use super::timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    InProgress,
    Submitted,
    Expired,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::InProgress)
    }

    /// The wire/storage spelling. Must agree with the serde representation:
    /// store filters compare against these strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptState::InProgress => "in_progress",
            AttemptState::Submitted => "submitted",
            AttemptState::Expired => "expired",
        }
    }
}

/// One instance of a student taking one assessment. Created on the first
/// legitimate start call, finalized exactly once, never deleted: this record
/// is the permanent audit trail of the exam instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub assessment_id: String,
    /// Server clock at creation. The client clock is never consulted.
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub state: AttemptState,
    pub submitted_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    /// question id -> selected alternative id, written once at finalize.
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

impl Attempt {
    pub fn begin(student_id: &str, assessment: &Assessment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            assessment_id: assessment.id.clone(),
            started_at: now,
            deadline: now + chrono::Duration::seconds(assessment.duration_seconds),
            state: AttemptState::InProgress,
            submitted_at: None,
            score: None,
            answers: HashMap::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Terminal fields applied by the store's compare-and-set. Serializes to the
/// same field encoding as `Attempt`, so a `$set` of this document leaves the
/// record readable through the same serde path.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalOutcome {
    pub state: AttemptState,
    pub submitted_at: DateTime<Utc>,
    pub score: f64,
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(length(min = 1))]
    pub assessment_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: String,
    pub deadline: DateTime<Utc>,
    pub state: AttemptState,
    pub score: Option<f64>,
}

impl From<&Attempt> for StartAttemptResponse {
    fn from(attempt: &Attempt) -> Self {
        Self {
            attempt_id: attempt.id.clone(),
            deadline: attempt.deadline,
            state: attempt.state,
            score: attempt.score,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinalizeAttemptRequest {
    /// Full snapshot, not a diff: a retried finalize carries identical data.
    #[validate(nested)]
    pub answers: Vec<AnswerSelection>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeAttemptResponse {
    pub state: AttemptState,
    pub score: Option<f64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<&Attempt> for FinalizeAttemptResponse {
    fn from(attempt: &Attempt) -> Self {
        Self {
            state: attempt.state,
            score: attempt.score,
            submitted_at: attempt.submitted_at,
        }
    }
}

/// Owner-only read view; carries the live countdown so a reloaded client can
/// resume against the original deadline.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: String,
    pub assessment_id: String,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub state: AttemptState,
    pub submitted_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub answers: HashMap<String, String>,
}

impl AttemptView {
    pub fn new(attempt: &Attempt, now: DateTime<Utc>) -> Self {
        Self {
            id: attempt.id.clone(),
            assessment_id: attempt.assessment_id.clone(),
            started_at: attempt.started_at,
            deadline: attempt.deadline,
            remaining_seconds: timer::remaining_seconds(attempt.deadline, now),
            state: attempt.state,
            submitted_at: attempt.submitted_at,
            score: attempt.score,
            answers: attempt.answers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serde_matches_storage_spelling() {
        for state in [
            AttemptState::InProgress,
            AttemptState::Submitted,
            AttemptState::Expired,
        ] {
            let json = serde_json::to_value(state).unwrap();
            assert_eq!(json, serde_json::Value::String(state.as_str().to_string()));
        }
    }

    #[test]
    fn only_in_progress_is_non_terminal() {
        assert!(!AttemptState::InProgress.is_terminal());
        assert!(AttemptState::Submitted.is_terminal());
        assert!(AttemptState::Expired.is_terminal());
    }

    #[test]
    fn begin_derives_deadline_from_duration() {
        let assessment = crate::models::assessment::Assessment {
            id: "sim-1".to_string(),
            title: "Simulado".to_string(),
            class_ids: vec![],
            duration_seconds: 600,
            opens_at: Utc::now(),
            closes_at: Utc::now(),
            active: true,
            questions: vec![],
        };
        let now = Utc::now();
        let attempt = Attempt::begin("student-1", &assessment, now);

        assert_eq!(attempt.deadline, now + chrono::Duration::seconds(600));
        assert_eq!(attempt.state, AttemptState::InProgress);
        assert!(attempt.score.is_none());
        assert!(attempt.answers.is_empty());
    }
}
