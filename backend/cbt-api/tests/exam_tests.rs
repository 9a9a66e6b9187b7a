use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn start_exam_draws_requested_question_count() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;

    let (status, body) = common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom", "count": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["questions"].as_array().unwrap().len(), 5);
    assert_eq!(body["mode"], "timedRandom");
    assert!(body["answers"].as_object().unwrap().is_empty());
    assert_eq!(body["remaining_time"], 3600);
}

#[tokio::test]
async fn start_exam_requires_login() {
    let app = common::create_test_app();

    let (status, _) = common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submit_answer_validates_question_and_choice() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;
    let (_, session) = common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom", "count": 3 }),
    )
    .await;
    let question_id = session["questions"][0]["id"].as_u64().unwrap();

    let (status, body) = common::post_json(
        &app.router,
        "/api/v1/exam/answers",
        json!({ "question_id": question_id, "choice": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answered"], 1);
    assert_eq!(body["total"], 3);

    let (status, _) = common::post_json(
        &app.router,
        "/api/v1/exam/answers",
        json!({ "question_id": 999_999, "choice": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::post_json(
        &app.router,
        "/api/v1/exam/answers",
        json!({ "question_id": question_id, "choice": 42 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scoring_and_completion_update_wrong_answer_book() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;
    let (_, session) = common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom", "count": 4 }),
    )
    .await;
    let questions = session["questions"].as_array().unwrap().clone();

    // Answer the first two correctly and the third wrongly.
    for (i, q) in questions.iter().take(3).enumerate() {
        let correct = q["answer"].as_u64().unwrap() as usize;
        let choice = if i < 2 { correct } else { (correct + 1) % 4 };
        let (status, _) = common::post_json(
            &app.router,
            "/api/v1/exam/answers",
            json!({ "question_id": q["id"], "choice": choice }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, report) = common::get_json(&app.router, "/api/v1/exam/score").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 4);
    assert_eq!(report["correct"], 2);
    assert_eq!(report["wrong"], 1);
    assert_eq!(report["unanswered"], 1);
    assert_eq!(report["score"], 50);
    assert_eq!(report["passed"], false);

    let wrong_id = questions[2]["id"].as_u64().unwrap() as u32;
    let (status, completion) = common::post_json(&app.router, "/api/v1/exam/complete", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completion["forced"], false);
    assert_eq!(completion["report"]["score"], 50);

    let book = app.store.get_wrong_answers();
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].question_id, wrong_id);

    // The session is gone; a second submission attempt is a 404.
    let (status, _) = common::post_json(&app.router, "/api/v1/exam/complete", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_answer_review_replays_book_and_clears_corrected() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;
    app.store.add_wrong_answer(1).unwrap();
    app.store.add_wrong_answer(2).unwrap();

    let (status, session) = common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let questions = session["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);

    // Answer question 1 correctly, leave question 2 untouched.
    let q1 = questions.iter().find(|q| q["id"] == 1).unwrap();
    let (status, _) = common::post_json(
        &app.router,
        "/api/v1/exam/answers",
        json!({ "question_id": 1, "choice": q1["answer"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, completion) =
        common::post_json(&app.router, "/api/v1/exam/complete", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completion["report"]["answered_count"], 1);
    assert!(completion["report"]["encouragement"].is_string());

    let book = app.store.get_wrong_answers();
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].question_id, 2);
}

#[tokio::test]
async fn review_mode_requires_a_nonempty_book() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;

    let (status, _) = common::post_json(&app.router, "/api/v1/exam", json!({ "mode": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_timer_restores_the_flat_hour() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;
    common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom", "count": 3 }),
    )
    .await;

    let (status, body) =
        common::post_json(&app.router, "/api/v1/exam/reset-timer", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_time"], 3600);
    assert_eq!(body["display"], "60:00");
    assert_eq!(body["time_reset"], true);

    let session = app.store.current_exam_session().unwrap();
    assert!(session.time_reset);
}

#[tokio::test]
async fn print_sheet_returns_a_pdf() {
    let app = common::create_test_app();
    common::register_and_login(&app.router, "Kim", "010-1234-5678").await;
    common::post_json(
        &app.router,
        "/api/v1/exam",
        json!({ "mode": "timedRandom", "count": 3 }),
    )
    .await;

    for option in ["questionsOnly", "withAnswers", "withExplanations"] {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/exam/print?option={option}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/pdf"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

#[tokio::test]
async fn hint_falls_back_to_explanation() {
    let app = common::create_test_app();

    // Question 3 in the seed bank has no dedicated hint.
    let (status, body) = common::get_json(&app.router, "/api/v1/questions/3/hint").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["hint"].as_str().unwrap().contains("P = V x I"));

    let (status, body) = common::get_json(&app.router, "/api/v1/questions/1/hint").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hint"], "Apply Ohm's law.");

    let (status, _) = common::get_json(&app.router, "/api/v1/questions/999999/hint").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_answer_endpoint_lists_the_book() {
    let app = common::create_test_app();
    app.store.add_wrong_answer(5).unwrap();

    let (status, body) = common::get_json(&app.router, "/api/v1/wrong-answers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["question_id"], 5);
}

#[tokio::test]
async fn health_reports_seeded_store() {
    let app = common::create_test_app();
    let (status, body) = common::get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dependencies"]["store"]["status"], "healthy");
}
