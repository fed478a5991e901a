use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Extension,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    error::EngineError,
    middlewares::auth::JwtClaims,
    models::timer::Countdown,
    services::{attempt_service::AttemptService, AppState},
};

/// SSE countdown for an in-progress attempt.
/// GET /api/v1/attempts/{id}/stream
///
/// Every tick recomputes remaining time from the stored deadline and a fresh
/// clock sample, so a stalled or backgrounded stream self-corrects instead of
/// drifting. The final `time-expired` event is a display trigger only; the
/// authoritative on-time decision stays with finalize.
pub async fn attempt_stream(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let service = AttemptService::new(state.store.clone(), state.catalog.clone());
    let attempt = service.get(&claims.sub, &attempt_id).await?;

    if attempt.is_terminal() {
        return Err(EngineError::Conflict(
            "attempt already finalized".to_string(),
        ));
    }

    let tick_interval = tick_interval_ms();
    tracing::info!(
        "Starting countdown stream: attempt={}, deadline={}, tick_interval={}ms",
        attempt.id,
        attempt.deadline,
        tick_interval
    );
    let stream = create_countdown_stream(attempt.id.clone(), attempt.deadline, tick_interval);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn tick_interval_ms() -> u64 {
    std::env::var("SSE_TICK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000)
}

fn create_countdown_stream(
    attempt_id: String,
    deadline: DateTime<Utc>,
    tick_interval_ms: u64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        (Countdown::new(deadline), true),
        move |(mut countdown, first)| {
            let attempt_id = attempt_id.clone();
            async move {
                if !first {
                    sleep(Duration::from_millis(tick_interval_ms)).await;
                }

                // Sample the clock after the sleep so the emitted value is
                // current, not a second stale.
                let timer_event = countdown.tick(&attempt_id, Utc::now())?;
                let event = Event::default()
                    .event(timer_event.event_name())
                    .data(timer_event.to_sse_data());

                Some((Ok(event), (countdown, false)))
            }
        },
    )
}
