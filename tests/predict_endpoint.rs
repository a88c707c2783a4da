mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::Value;

use common::{seed_student, seed_teacher, state_with, StubModel};
use school_performance::database::AttendanceStatus;
use school_performance::routes::{self, PredictionResponse};

#[actix_web::test]
async fn student_without_data_gets_zero_answer_and_no_model_call() {
    let model = StubModel::returning(55.0);
    let (state, db) = state_with(model.clone()).await;
    let subject = db.create_subject("Math").await.unwrap();
    seed_teacher(&db, "t@school.test", subject).await;
    let student = seed_student(&db, "Ann", "ann@school.test", &[subject]).await;

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    let req = test::TestRequest::get()
        .uri(&format!("/student/{student}/predict"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PredictionResponse = test::read_body_json(resp).await;
    assert_eq!(body.student_id, student);
    assert_eq!(body.attendance_percent, 0.0);
    assert_eq!(body.participation_percent, 0.0);
    assert_eq!(body.past_grade, 0.0);
    assert_eq!(body.predicted_final_grade, 0.0);
    assert_eq!(
        body.message.as_deref(),
        Some("No performance data available yet. Check back later once data is added.")
    );
    assert_eq!(model.calls(), 0);
}

#[actix_web::test]
async fn unknown_student_is_treated_as_having_no_data() {
    let model = StubModel::returning(55.0);
    let (state, _db) = state_with(model.clone()).await;

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    let req = test::TestRequest::get().uri("/student/999/predict").to_request();
    let body: PredictionResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.student_id, 999);
    assert_eq!(body.predicted_final_grade, 0.0);
    assert!(body.message.is_some());
    assert_eq!(model.calls(), 0);
}

#[actix_web::test]
async fn recorded_data_flows_through_the_model() {
    let model = StubModel::returning(61.5);
    let (state, db) = state_with(model.clone()).await;
    let subject = db.create_subject("Science").await.unwrap();
    seed_teacher(&db, "t@school.test", subject).await;
    let student = seed_student(&db, "Ben", "ben@school.test", &[subject]).await;

    let mut marks = vec![(student, AttendanceStatus::Present); 7];
    marks.extend([(student, AttendanceStatus::Late); 2]);
    marks.push((student, AttendanceStatus::Absent));
    db.record_attendance(subject, &marks).await.unwrap();

    db.save_participation(subject, 1, &[(student, 5.0)], &[]).await.unwrap();
    db.save_participation(subject, 1, &[(student, 7.0)], &[]).await.unwrap();
    db.save_participation(subject, 2, &[(student, 9.0)], &[]).await.unwrap();

    db.insert_grade(student, subject, "Assignment 1", 80.0).await.unwrap();
    db.insert_grade(student, subject, "Exam 2", 100.0).await.unwrap();

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    let req = test::TestRequest::get()
        .uri(&format!("/student/{student}/predict"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: PredictionResponse = test::read_body_json(resp).await;

    assert!((body.attendance_percent - 84.0).abs() < 1e-9);
    assert!((body.participation_percent - 75.0).abs() < 1e-9);
    assert!((body.past_grade - 80.0).abs() < 1e-9);
    assert_eq!(body.predicted_final_grade, 61.5);
    assert!(body.message.is_none());

    assert_eq!(model.calls(), 1);
    let seen = model.last_input.lock().unwrap().unwrap();
    assert!((seen.attendance_percent - 84.0).abs() < 1e-9);
    assert!((seen.past_grade - 80.0).abs() < 1e-9);
}

#[actix_web::test]
async fn normal_response_has_no_message_key() {
    let model = StubModel::returning(40.0);
    let (state, db) = state_with(model.clone()).await;
    let subject = db.create_subject("Art").await.unwrap();
    seed_teacher(&db, "t@school.test", subject).await;
    let student = seed_student(&db, "Cy", "cy@school.test", &[subject]).await;
    db.insert_grade(student, subject, "Quiz 1", 50.0).await.unwrap();

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    let req = test::TestRequest::get()
        .uri(&format!("/student/{student}/predict"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body.get("message").is_none());
    assert_eq!(body["attendance_percent"], 0.0);
    assert_eq!(body["past_grade"], 50.0);
    assert_eq!(body["predicted_final_grade"], 40.0);
}

#[actix_web::test]
async fn model_failure_is_an_opaque_server_error() {
    let model = StubModel::failing("matrix exploded");
    let (state, db) = state_with(model.clone()).await;
    let subject = db.create_subject("History").await.unwrap();
    seed_teacher(&db, "t@school.test", subject).await;
    let student = seed_student(&db, "Di", "di@school.test", &[subject]).await;
    db.record_attendance(subject, &[(student, AttendanceStatus::Present)])
        .await
        .unwrap();

    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    let req = test::TestRequest::get()
        .uri(&format!("/student/{student}/predict"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("matrix"));
    assert_eq!(model.calls(), 1);
}

#[actix_web::test]
async fn database_failure_is_an_opaque_server_error() {
    let model = StubModel::returning(50.0);
    let (state, db) = state_with(model.clone()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;
    db.pool().close().await;

    let req = test::TestRequest::get().uri("/student/1/predict").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    assert_eq!(model.calls(), 0);
}

#[actix_web::test]
async fn non_numeric_student_id_is_a_bad_request() {
    let (state, _db) = state_with(StubModel::returning(1.0)).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(routes::configure)).await;

    let req = test::TestRequest::get().uri("/student/abc/predict").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
