pub mod answer;
pub mod assessment;
pub mod attempt;
pub mod timer;

pub use answer::{AnswerLedger, AnswerSelection};
pub use assessment::{
    Alternative, Assessment, AssessmentSummary, AssessmentView, Question,
};
pub use attempt::{
    Attempt, AttemptState, AttemptView, FinalizeAttemptRequest, FinalizeAttemptResponse,
    StartAttemptRequest, StartAttemptResponse, TerminalOutcome,
};
