mod common;

use axum::http::StatusCode;

use common::{bearer_token, create_test_app, sample_assessment, send};

#[tokio::test]
async fn list_shows_only_the_callers_classes() {
    let test = create_test_app();
    test.catalog.insert(sample_assessment("sim-mine", "turma-a"));
    test.catalog
        .insert(sample_assessment("sim-other", "turma-b"));
    let token = bearer_token("student-1", &["turma-a"]);

    let (status, body) = send(&test.app, "GET", "/api/v1/assessments", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "sim-mine");
    assert_eq!(list[0]["question_count"], 2);
    assert_eq!(list[0]["total_value"], 10.0);
}

#[tokio::test]
async fn list_excludes_inactive_assessments() {
    let test = create_test_app();
    let mut inactive = sample_assessment("sim-off", "turma-a");
    inactive.active = false;
    test.catalog.insert(inactive);
    let token = bearer_token("student-1", &["turma-a"]);

    let (status, body) = send(&test.app, "GET", "/api/v1/assessments", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_requires_token() {
    let test = create_test_app();

    let (status, _) = send(&test.app, "GET", "/api/v1/assessments", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_assessment_never_leaks_the_answer_key() {
    let test = create_test_app();
    test.catalog.insert(sample_assessment("sim-1", "turma-a"));
    let token = bearer_token("student-1", &["turma-a"]);

    let (status, body) = send(
        &test.app,
        "GET",
        "/api/v1/assessments/sim-1",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_value"], 10.0);
    assert_eq!(body["duration_seconds"], 600);

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        for alternative in question["alternatives"].as_array().unwrap() {
            assert!(alternative.get("is_correct").is_none());
            assert!(alternative.get("id").is_some());
            assert!(alternative.get("label").is_some());
            assert!(alternative.get("text").is_some());
        }
    }
}

#[tokio::test]
async fn get_unknown_assessment_is_not_found() {
    let test = create_test_app();
    let token = bearer_token("student-1", &["turma-a"]);

    let (status, _) = send(
        &test.app,
        "GET",
        "/api/v1/assessments/missing",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_other_class_assessment_is_hidden() {
    let test = create_test_app();
    test.catalog.insert(sample_assessment("sim-1", "turma-b"));
    let token = bearer_token("student-1", &["turma-a"]);

    let (status, _) = send(
        &test.app,
        "GET",
        "/api/v1/assessments/sim-1",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
