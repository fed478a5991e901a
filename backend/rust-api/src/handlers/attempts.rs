use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::EngineError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::attempt::{
        AttemptView, FinalizeAttemptRequest, FinalizeAttemptResponse, StartAttemptRequest,
        StartAttemptResponse,
    },
    services::{attempt_service::AttemptService, AppState},
};

/// POST /api/v1/attempts/start
///
/// Idempotent per (student, assessment): a reload mid-exam gets the same
/// attempt and the same deadline back.
pub async fn start_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<StartAttemptRequest>,
) -> Result<impl IntoResponse, EngineError> {
    req.validate()?;
    tracing::info!(
        "Start attempt requested: student={}, assessment={}",
        claims.sub,
        req.assessment_id
    );

    let service = AttemptService::new(state.store.clone(), state.catalog.clone());
    let outcome = service
        .start(&claims.sub, &claims.group_ids, &req.assessment_id)
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(StartAttemptResponse::from(&outcome.attempt))))
}

/// POST /api/v1/attempts/{id}/finalize
///
/// Idempotent: a repeated call — any payload — returns the original result.
pub async fn finalize_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
    AppJson(req): AppJson<FinalizeAttemptRequest>,
) -> Result<impl IntoResponse, EngineError> {
    req.validate()?;
    tracing::info!(
        "Finalize requested: student={}, attempt={}, answers={}",
        claims.sub,
        attempt_id,
        req.answers.len()
    );

    let service = AttemptService::new(state.store.clone(), state.catalog.clone());
    let attempt = service
        .finalize(&claims.sub, &attempt_id, &req.answers)
        .await?;

    Ok(Json(FinalizeAttemptResponse::from(&attempt)))
}

/// GET /api/v1/attempts/{id} — owner-only view with the live countdown.
pub async fn get_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let service = AttemptService::new(state.store.clone(), state.catalog.clone());
    let attempt = service.get(&claims.sub, &attempt_id).await?;

    Ok(Json(AttemptView::new(&attempt, Utc::now())))
}
