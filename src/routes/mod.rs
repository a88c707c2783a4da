//! HTTP surface. [`configure`] mounts every route so the server binary and
//! the integration tests serve the same app.

mod accounts;
mod admin;
mod attendance;
mod catalog;
mod grades;
mod homework;
mod messages;
mod participation;
mod predict;
mod students;

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::database::Database;
use crate::error::{ApiError, ApiResult};
use crate::model::GradeModel;

pub use predict::PredictionResponse;

/// Everything a handler needs, injected through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub model: Arc<dyn GradeModel>,
}

impl AppState {
    pub fn new(db: Database, model: Arc<dyn GradeModel>) -> Self {
        Self { db, model }
    }
}

#[derive(Serialize)]
struct Ack {
    message: String,
}

fn ack(message: impl Into<String>) -> Ack {
    Ack {
        message: message.into(),
    }
}

/// Treats absent and blank strings alike.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn require<T>(value: Option<T>, message: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::bad_request(message))
}

async fn home() -> HttpResponse {
    HttpResponse::Ok().json(ack("Welcome to the Student Performance System!"))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("School performance API is running!")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid request body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid query params: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid path: {err}")).into()
    }))
    .route("/", web::get().to(home))
    .route("/health", web::get().to(health_check))
    // accounts
    .route("/login", web::post().to(accounts::login))
    .route("/register", web::post().to(accounts::register))
    // admin
    .route("/admin/add-teacher", web::post().to(admin::add_teacher))
    .route("/admin/update-teacher/{teacher_id}", web::put().to(admin::update_teacher))
    .route("/admin/delete-teacher/{teacher_id}", web::delete().to(admin::delete_teacher))
    .route("/admin/add-student", web::post().to(admin::add_student))
    .route("/admin/update-student/{student_id}", web::put().to(admin::update_student))
    .route("/admin/delete-student/{student_id}", web::delete().to(admin::delete_student))
    // catalog
    .route("/students", web::get().to(catalog::list_students))
    .route("/teachers", web::get().to(catalog::list_teachers))
    .route("/subjects", web::get().to(catalog::list_subjects))
    .route("/subjects", web::post().to(catalog::add_subject))
    .route("/teachers/create-new-class", web::post().to(catalog::create_class))
    .route("/teachers/{teacher_id}/classes", web::get().to(catalog::teacher_classes))
    .route("/classes/{class_id}/students", web::get().to(catalog::class_students))
    .route("/teacher/{teacher_id}/students", web::get().to(catalog::teacher_students))
    // records
    .route("/grades", web::post().to(grades::add_grade))
    .route("/grades", web::put().to(grades::update_grade))
    .route("/grades/existing", web::get().to(grades::existing_grade))
    .route("/attendance", web::post().to(attendance::add_attendance))
    .route("/participation", web::post().to(participation::add_participation))
    // homework
    .route("/homework", web::post().to(homework::add_homework))
    .route("/homework", web::get().to(homework::class_homework))
    .route("/homework/{homework_id}", web::delete().to(homework::delete_homework))
    .route("/teacher/{teacher_id}/homeworks", web::get().to(homework::teacher_homework))
    .route("/student/{student_id}/homeworks", web::get().to(homework::student_homework))
    // messaging
    .route("/messages", web::get().to(messages::conversation))
    .route("/messages", web::post().to(messages::send_message))
    .route("/student_messages", web::get().to(messages::conversation))
    .route("/student_messages", web::post().to(messages::send_message))
    .route("/messages/mark_read/teacher", web::patch().to(messages::mark_read_by_teacher))
    .route("/messages/mark_read/student", web::patch().to(messages::mark_read_by_student))
    .route("/messages/unread_count", web::get().to(messages::unread_for_student))
    .route("/messages/unread_count/teacher", web::get().to(messages::unread_for_teacher))
    // student views
    .route("/student/{student_id}/subjects", web::get().to(students::subjects))
    .route("/student/{student_id}/teachers", web::get().to(students::teachers))
    .route("/student/{student_id}/grades-overview", web::get().to(students::grades_overview))
    .route("/student/{student_id}/notifications", web::get().to(students::notifications))
    .route("/notifications/{student_id}/clear", web::delete().to(students::clear_notifications))
    .route("/student/{student_id}/predict", web::get().to(predict::predict_student));
}
