use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::EngineError,
    middlewares::auth::JwtClaims,
    models::assessment::{AssessmentSummary, AssessmentView},
    services::AppState,
};

/// GET /api/v1/assessments — simulados visible to the caller's turmas.
pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<AssessmentSummary>>, EngineError> {
    let assessments = state.catalog.list_for_classes(&claims.group_ids).await?;
    Ok(Json(assessments.iter().map(AssessmentSummary::from).collect()))
}

/// GET /api/v1/assessments/{id} — metadata, questions and alternatives.
/// The answer key never leaves the server before finalize.
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<AssessmentView>, EngineError> {
    let assessment = state
        .catalog
        .fetch(&assessment_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("assessment {} not found", assessment_id)))?;

    if !assessment.assigned_to_any(&claims.group_ids) {
        return Err(EngineError::NotFound(format!(
            "assessment {} not found",
            assessment_id
        )));
    }

    Ok(Json(AssessmentView::from(&assessment)))
}
