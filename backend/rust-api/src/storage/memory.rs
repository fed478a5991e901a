use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;

use crate::models::assessment::Assessment;
use crate::models::attempt::{Attempt, AttemptState, TerminalOutcome};

use super::{AssessmentCatalog, AttemptStore};

/// Map-backed attempt store for dev mode and hermetic tests. A single mutex
/// serializes every operation, which trivially satisfies the store's
/// compare-and-set contract.
#[derive(Default)]
pub struct InMemoryAttemptStore {
    attempts: Mutex<HashMap<String, Attempt>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace unconditionally, bypassing lifecycle rules.
    /// Seeding hook for dev fixtures and tests (e.g. attempts with an
    /// already-elapsed deadline).
    pub fn put(&self, attempt: Attempt) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attempt.id.clone(), attempt);
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn find_or_create_open(&self, fresh: Attempt) -> Result<(Attempt, bool)> {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = attempts.values().find(|a| {
            a.student_id == fresh.student_id
                && a.assessment_id == fresh.assessment_id
                && a.state == AttemptState::InProgress
        }) {
            return Ok((existing.clone(), false));
        }
        attempts.insert(fresh.id.clone(), fresh.clone());
        Ok((fresh, true))
    }

    async fn find_by_id(&self, attempt_id: &str) -> Result<Option<Attempt>> {
        Ok(self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(attempt_id)
            .cloned())
    }

    async fn find_latest(
        &self,
        student_id: &str,
        assessment_id: &str,
    ) -> Result<Option<Attempt>> {
        Ok(self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|a| a.student_id == student_id && a.assessment_id == assessment_id)
            .max_by_key(|a| a.started_at)
            .cloned())
    }

    async fn finalize_if_in_progress(
        &self,
        attempt_id: &str,
        outcome: TerminalOutcome,
    ) -> Result<Option<Attempt>> {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(attempt) = attempts.get_mut(attempt_id) else {
            return Ok(None);
        };
        if attempt.state != AttemptState::InProgress {
            return Ok(None);
        }
        attempt.state = outcome.state;
        attempt.submitted_at = Some(outcome.submitted_at);
        attempt.score = Some(outcome.score);
        attempt.answers = outcome.answers;
        Ok(Some(attempt.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Map-backed catalog for dev mode and tests.
#[derive(Default)]
pub struct InMemoryAssessmentCatalog {
    assessments: Mutex<HashMap<String, Assessment>>,
}

impl InMemoryAssessmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, assessment: Assessment) {
        self.assessments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(assessment.id.clone(), assessment);
    }
}

#[async_trait]
impl AssessmentCatalog for InMemoryAssessmentCatalog {
    async fn fetch(&self, assessment_id: &str) -> Result<Option<Assessment>> {
        Ok(self
            .assessments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(assessment_id)
            .cloned())
    }

    async fn list_for_classes(&self, class_ids: &[String]) -> Result<Vec<Assessment>> {
        let mut assessments: Vec<Assessment> = self
            .assessments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|a| a.active && a.assigned_to_any(class_ids))
            .cloned()
            .collect();
        assessments.sort_by(|a, b| a.opens_at.cmp(&b.opens_at));
        Ok(assessments)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    fn attempt(id: &str, student: &str, assessment: &str) -> Attempt {
        let now = Utc::now();
        Attempt {
            id: id.to_string(),
            student_id: student.to_string(),
            assessment_id: assessment.to_string(),
            started_at: now,
            deadline: now + Duration::seconds(600),
            state: AttemptState::InProgress,
            submitted_at: None,
            score: None,
            answers: HashMap::new(),
        }
    }

    fn outcome(state: AttemptState, score: f64) -> TerminalOutcome {
        TerminalOutcome {
            state,
            submitted_at: Utc::now(),
            score,
            answers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn find_or_create_returns_the_existing_open_attempt() {
        let store = InMemoryAttemptStore::new();

        let (first, created) = store
            .find_or_create_open(attempt("a-1", "s-1", "sim-1"))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = store
            .find_or_create_open(attempt("a-2", "s-1", "sim-1"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.deadline, first.deadline);
    }

    #[tokio::test]
    async fn find_or_create_ignores_other_students() {
        let store = InMemoryAttemptStore::new();
        store
            .find_or_create_open(attempt("a-1", "s-1", "sim-1"))
            .await
            .unwrap();

        let (other, created) = store
            .find_or_create_open(attempt("a-2", "s-2", "sim-1"))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(other.id, "a-2");
    }

    #[tokio::test]
    async fn finalize_cas_fires_once() {
        let store = InMemoryAttemptStore::new();
        store
            .find_or_create_open(attempt("a-1", "s-1", "sim-1"))
            .await
            .unwrap();

        let first = store
            .finalize_if_in_progress("a-1", outcome(AttemptState::Submitted, 5.0))
            .await
            .unwrap();
        assert_eq!(first.and_then(|a| a.score), Some(5.0));

        // Second writer loses: the stored result stands untouched.
        let second = store
            .finalize_if_in_progress("a-1", outcome(AttemptState::Submitted, 10.0))
            .await
            .unwrap();
        assert!(second.is_none());

        let stored = store.find_by_id("a-1").await.unwrap().unwrap();
        assert_eq!(stored.score, Some(5.0));
    }

    #[tokio::test]
    async fn finalize_unknown_attempt_is_none() {
        let store = InMemoryAttemptStore::new();
        let result = store
            .finalize_if_in_progress("nope", outcome(AttemptState::Expired, 0.0))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
