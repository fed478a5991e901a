use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timed multiple-choice exam ("simulado") as stored in the catalog.
/// Owned by the authoring side of the portal; read-only here. Immutable once
/// an attempt references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Turmas the simulado is assigned to.
    pub class_ids: Vec<String>,
    pub duration_seconds: i64,
    /// Availability window (dataInicio / dataFim).
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub active: bool,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub value: f64,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub id: String,
    pub label: String,
    pub text: String,
    /// Answer key. Never serialized into client-facing views.
    #[serde(default)]
    pub is_correct: bool,
}

impl Assessment {
    pub fn total_value(&self) -> f64 {
        self.questions.iter().map(|q| q.value).sum()
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now >= self.opens_at && now <= self.closes_at
    }

    pub fn assigned_to_any(&self, class_ids: &[String]) -> bool {
        self.class_ids.iter().any(|c| class_ids.contains(c))
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

impl Question {
    pub fn alternative(&self, alternative_id: &str) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == alternative_id)
    }
}

/// Client-facing projection: metadata + questions + alternatives, with the
/// answer key stripped. This is the only shape that leaves the server before
/// finalize.
#[derive(Debug, Serialize)]
pub struct AssessmentView {
    pub id: String,
    pub title: String,
    pub duration_seconds: i64,
    pub total_value: f64,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub prompt: String,
    pub value: f64,
    pub alternatives: Vec<AlternativeView>,
}

#[derive(Debug, Serialize)]
pub struct AlternativeView {
    pub id: String,
    pub label: String,
    pub text: String,
}

impl From<&Assessment> for AssessmentView {
    fn from(assessment: &Assessment) -> Self {
        Self {
            id: assessment.id.clone(),
            title: assessment.title.clone(),
            duration_seconds: assessment.duration_seconds,
            total_value: assessment.total_value(),
            opens_at: assessment.opens_at,
            closes_at: assessment.closes_at,
            questions: assessment
                .questions
                .iter()
                .map(|q| QuestionView {
                    id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    value: q.value,
                    alternatives: q
                        .alternatives
                        .iter()
                        .map(|a| AlternativeView {
                            id: a.id.clone(),
                            label: a.label.clone(),
                            text: a.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Row for the simulado list screen.
#[derive(Debug, Serialize)]
pub struct AssessmentSummary {
    pub id: String,
    pub title: String,
    pub duration_seconds: i64,
    pub total_value: f64,
    pub question_count: usize,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl From<&Assessment> for AssessmentSummary {
    fn from(assessment: &Assessment) -> Self {
        Self {
            id: assessment.id.clone(),
            title: assessment.title.clone(),
            duration_seconds: assessment.duration_seconds,
            total_value: assessment.total_value(),
            question_count: assessment.questions.len(),
            opens_at: assessment.opens_at,
            closes_at: assessment.closes_at,
        }
    }
}
