use std::sync::Arc;

use chrono::Utc;

use crate::error::EngineError;
use crate::metrics::{ATTEMPTS_FINALIZED_TOTAL, ATTEMPTS_STARTED_TOTAL};
use crate::models::answer::AnswerSelection;
use crate::models::attempt::{Attempt, AttemptState, TerminalOutcome};
use crate::storage::{AssessmentCatalog, AttemptStore};

use super::grading;

pub struct StartOutcome {
    pub attempt: Attempt,
    /// True when a new attempt record was inserted by this call.
    pub created: bool,
}

/// Owns the attempt lifecycle. The only party permitted to compute and
/// persist a score; every write goes through the store's atomic primitives,
/// so redundant client calls (reloads, double-fired submits, retries after
/// network loss) are safe by construction.
pub struct AttemptService {
    store: Arc<dyn AttemptStore>,
    catalog: Arc<dyn AssessmentCatalog>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn AttemptStore>, catalog: Arc<dyn AssessmentCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Idempotent start. An existing attempt for the pair is returned
    /// unchanged — in progress with its original deadline, or terminal with
    /// its stored result (the portal then renders the result screen instead
    /// of reopening the exam).
    pub async fn start(
        &self,
        student_id: &str,
        class_ids: &[String],
        assessment_id: &str,
    ) -> Result<StartOutcome, EngineError> {
        let assessment = self
            .catalog
            .fetch(assessment_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("assessment {} not found", assessment_id)))?;

        if !assessment.assigned_to_any(class_ids) {
            // Not distinguishable from a missing assessment: simulados of
            // other turmas stay invisible.
            return Err(EngineError::NotFound(format!(
                "assessment {} not found",
                assessment_id
            )));
        }

        // Existing attempts win over the window check: a reload after the
        // window closed must still recover the in-flight attempt and its
        // original deadline.
        if let Some(existing) = self.store.find_latest(student_id, assessment_id).await? {
            ATTEMPTS_STARTED_TOTAL.with_label_values(&["resumed"]).inc();
            tracing::info!(
                "Returning existing attempt {} (state: {}) for student={}, assessment={}",
                existing.id,
                existing.state.as_str(),
                student_id,
                assessment_id
            );
            return Ok(StartOutcome {
                attempt: existing,
                created: false,
            });
        }

        let now = Utc::now();
        if !assessment.is_open_at(now) {
            return Err(EngineError::Conflict(format!(
                "assessment {} is not currently open",
                assessment_id
            )));
        }

        let fresh = Attempt::begin(student_id, &assessment, now);
        let (attempt, created) = self.store.find_or_create_open(fresh).await?;
        ATTEMPTS_STARTED_TOTAL
            .with_label_values(&[if created { "fresh" } else { "resumed" }])
            .inc();
        tracing::info!(
            "Attempt {} started: student={}, assessment={}, deadline={}",
            attempt.id,
            student_id,
            assessment_id,
            attempt.deadline
        );
        Ok(StartOutcome { attempt, created })
    }

    /// Idempotent finalize. On-time status is decided here, against the
    /// stored deadline and this server's clock — never against a
    /// client-supplied timestamp. A late call still grades the supplied
    /// answers; a call against an already-terminal attempt returns the
    /// stored result untouched.
    pub async fn finalize(
        &self,
        caller_id: &str,
        attempt_id: &str,
        selections: &[AnswerSelection],
    ) -> Result<Attempt, EngineError> {
        let attempt = self
            .store
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("attempt {} not found", attempt_id)))?;

        if attempt.student_id != caller_id {
            return Err(EngineError::Conflict(
                "attempt belongs to another student".to_string(),
            ));
        }

        if attempt.is_terminal() {
            ATTEMPTS_FINALIZED_TOTAL
                .with_label_values(&["duplicate"])
                .inc();
            tracing::info!(
                "Finalize replay for attempt {}: returning stored result",
                attempt_id
            );
            return Ok(attempt);
        }

        let assessment = self
            .catalog
            .fetch(&attempt.assessment_id)
            .await?
            .ok_or_else(|| {
                EngineError::Internal(anyhow::anyhow!(
                    "assessment {} referenced by attempt {} is gone",
                    attempt.assessment_id,
                    attempt_id
                ))
            })?;

        let answers = grading::collect_snapshot(&assessment, selections)?;

        let now = Utc::now();
        let state = if now <= attempt.deadline {
            AttemptState::Submitted
        } else {
            AttemptState::Expired
        };
        let graded = grading::grade(&assessment, &answers);

        let outcome = TerminalOutcome {
            state,
            submitted_at: now,
            score: graded.score,
            answers,
        };

        match self.store.finalize_if_in_progress(attempt_id, outcome).await? {
            Some(finalized) => {
                ATTEMPTS_FINALIZED_TOTAL
                    .with_label_values(&[state.as_str()])
                    .inc();
                tracing::info!(
                    "Attempt {} finalized: state={}, score={}, answered={}/{}",
                    attempt_id,
                    state.as_str(),
                    graded.score,
                    graded.answered,
                    assessment.questions.len()
                );
                Ok(finalized)
            }
            None => {
                // Lost the race to a concurrent finalize (second tab, or a
                // timeout auto-submit crossing a manual click). First call
                // won; this one reads the result it produced.
                let stored = self
                    .store
                    .find_by_id(attempt_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("attempt {} not found", attempt_id))
                    })?;
                ATTEMPTS_FINALIZED_TOTAL
                    .with_label_values(&["duplicate"])
                    .inc();
                tracing::info!(
                    "Attempt {} was finalized concurrently: returning stored result",
                    attempt_id
                );
                Ok(stored)
            }
        }
    }

    /// Owner-only read of a single attempt.
    pub async fn get(&self, caller_id: &str, attempt_id: &str) -> Result<Attempt, EngineError> {
        let attempt = self
            .store
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("attempt {} not found", attempt_id)))?;
        if attempt.student_id != caller_id {
            return Err(EngineError::Conflict(
                "attempt belongs to another student".to_string(),
            ));
        }
        Ok(attempt)
    }
}
