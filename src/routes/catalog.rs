use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{present, require, AppState};
use crate::error::{ApiError, ApiResult};

pub async fn list_students(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_students().await?))
}

pub async fn list_teachers(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_teachers().await?))
}

pub async fn list_subjects(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_subjects().await?))
}

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    name: Option<String>,
}

pub async fn add_subject(state: web::Data<AppState>, body: web::Json<SubjectRequest>) -> ApiResult<HttpResponse> {
    let name = require(present(body.into_inner().name), "Subject name is required")?;
    let name = name.trim();

    if state.db.find_subject_by_name(name).await?.is_some() {
        return Err(ApiError::bad_request("Subject already exists"));
    }

    let subject_id = state.db.create_subject(name).await?;
    log::info!("added subject {subject_id} ({name})");
    Ok(HttpResponse::Created().json(json!({
        "message": "Subject added successfully!",
        "subject_id": subject_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct NewClassRequest {
    teacher_id: Option<i64>,
    subject_id: Option<i64>,
}

pub async fn create_class(state: web::Data<AppState>, body: web::Json<NewClassRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(teacher_id), Some(subject_id)) = (body.teacher_id, body.subject_id) else {
        return Err(ApiError::bad_request("Missing teacher_id or subject_id"));
    };

    if state.db.find_teacher(teacher_id).await?.is_none() {
        return Err(ApiError::not_found("Teacher not found"));
    }
    if state.db.find_subject(subject_id).await?.is_none() {
        return Err(ApiError::not_found("Subject not found"));
    }

    let (class_id, class_number) = state.db.open_class(teacher_id, subject_id).await?;
    log::info!("teacher {teacher_id} opened class {class_number} in subject {subject_id}");
    Ok(HttpResponse::Created().json(json!({
        "message": "New class created successfully!",
        "class_id": class_id,
        "class_number": class_number,
    })))
}

pub async fn teacher_classes(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let teacher_id = path.into_inner();
    if state.db.find_teacher(teacher_id).await?.is_none() {
        return Err(ApiError::not_found("Teacher not found"));
    }
    Ok(HttpResponse::Ok().json(state.db.classes_for_teacher(teacher_id).await?))
}

pub async fn class_students(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.students_in_class(path.into_inner()).await?))
}

pub async fn teacher_students(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let teacher_id = path.into_inner();
    if state.db.find_teacher(teacher_id).await?.is_none() {
        return Err(ApiError::not_found("Teacher not found"));
    }
    Ok(HttpResponse::Ok().json(state.db.students_of_teacher(teacher_id).await?))
}
