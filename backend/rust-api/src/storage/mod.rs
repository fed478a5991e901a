use anyhow::Result;
use async_trait::async_trait;

use crate::models::assessment::Assessment;
use crate::models::attempt::{Attempt, TerminalOutcome};

pub mod memory;
pub mod mongo;

/// Persistence seam for attempt records — the only shared mutable resource in
/// the engine. Both atomic primitives exist so that the service layer never
/// has to hold a lock across a network call:
///
/// * `find_or_create_open` makes start idempotent under concurrent calls
///   (at most one in-progress attempt per student/assessment pair);
/// * `finalize_if_in_progress` is the per-attempt compare-and-set that makes
///   grading first-call-wins (later callers read the stored result).
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Returns the open attempt for `fresh`'s (student, assessment) pair,
    /// inserting `fresh` when none exists. The bool is true when `fresh` was
    /// inserted.
    async fn find_or_create_open(&self, fresh: Attempt) -> Result<(Attempt, bool)>;

    async fn find_by_id(&self, attempt_id: &str) -> Result<Option<Attempt>>;

    /// Most recent attempt for the pair, regardless of state.
    async fn find_latest(&self, student_id: &str, assessment_id: &str)
        -> Result<Option<Attempt>>;

    /// Compare-and-set `InProgress -> terminal`. Returns the finalized
    /// attempt, or None when the attempt is missing or already terminal (the
    /// caller then re-reads and returns the stored result).
    async fn finalize_if_in_progress(
        &self,
        attempt_id: &str,
        outcome: TerminalOutcome,
    ) -> Result<Option<Attempt>>;

    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// Read-only access to the assessment catalog. The catalog is owned by the
/// authoring side of the portal; this engine only consumes it.
#[async_trait]
pub trait AssessmentCatalog: Send + Sync {
    async fn fetch(&self, assessment_id: &str) -> Result<Option<Assessment>>;

    /// Active assessments assigned to any of the given turmas.
    async fn list_for_classes(&self, class_ids: &[String]) -> Result<Vec<Assessment>>;

    async fn ping(&self) -> Result<()>;
}
