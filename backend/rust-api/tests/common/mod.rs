#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use simulado_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::assessment::{Alternative, Assessment, Question},
    services::AppState,
    storage::memory::{InMemoryAssessmentCatalog, InMemoryAttemptStore},
};

pub const TEST_JWT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryAttemptStore>,
    pub catalog: Arc<InMemoryAssessmentCatalog>,
}

/// Full router over the in-memory backend: no external services, same code
/// path as production from the middleware down.
pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        storage_backend: "memory".to_string(),
        mongo_uri: String::new(),
        mongo_database: String::new(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let store = Arc::new(InMemoryAttemptStore::new());
    let catalog = Arc::new(InMemoryAssessmentCatalog::new());
    let state = Arc::new(AppState::new(config, store.clone(), catalog.clone()));

    TestApp {
        app: create_router(state),
        store,
        catalog,
    }
}

pub fn bearer_token(student_id: &str, class_ids: &[&str]) -> String {
    let service = JwtService::new(TEST_JWT_SECRET);
    let claims = JwtClaims {
        sub: student_id.to_string(),
        role: "student".to_string(),
        group_ids: class_ids.iter().map(|c| c.to_string()).collect(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        iat: Utc::now().timestamp() as usize,
    };
    service
        .generate_token(claims)
        .expect("test token generation")
}

/// Two questions worth 5 points each, 10 minute duration, currently open.
/// Correct alternatives: q1-a and q2-b.
pub fn sample_assessment(id: &str, class_id: &str) -> Assessment {
    Assessment {
        id: id.to_string(),
        title: "Simulado de Matemática".to_string(),
        class_ids: vec![class_id.to_string()],
        duration_seconds: 600,
        opens_at: Utc::now() - Duration::hours(1),
        closes_at: Utc::now() + Duration::hours(1),
        active: true,
        questions: vec![
            Question {
                id: "q1".to_string(),
                prompt: "Quanto é 2 + 2?".to_string(),
                value: 5.0,
                alternatives: vec![
                    Alternative {
                        id: "q1-a".to_string(),
                        label: "A".to_string(),
                        text: "4".to_string(),
                        is_correct: true,
                    },
                    Alternative {
                        id: "q1-b".to_string(),
                        label: "B".to_string(),
                        text: "5".to_string(),
                        is_correct: false,
                    },
                    Alternative {
                        id: "q1-c".to_string(),
                        label: "C".to_string(),
                        text: "22".to_string(),
                        is_correct: false,
                    },
                ],
            },
            Question {
                id: "q2".to_string(),
                prompt: "Quanto é 3 × 3?".to_string(),
                value: 5.0,
                alternatives: vec![
                    Alternative {
                        id: "q2-a".to_string(),
                        label: "A".to_string(),
                        text: "6".to_string(),
                        is_correct: false,
                    },
                    Alternative {
                        id: "q2-b".to_string(),
                        label: "B".to_string(),
                        text: "9".to_string(),
                        is_correct: true,
                    },
                ],
            },
        ],
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
