use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ack, present, require, AppState};
use crate::database::{Homework, NewHomework, StudentHomework};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct HomeworkRequest {
    teacher_id: Option<i64>,
    class_id: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassQuery {
    class_id: Option<i64>,
}

#[derive(Serialize)]
struct HomeworkView {
    id: i64,
    class_id: i64,
    subject_id: i64,
    teacher_id: i64,
    title: String,
    description: Option<String>,
    file_path: Option<String>,
    created_at: String,
}

impl HomeworkView {
    fn new(homework: Homework, created_at: String) -> Self {
        Self {
            id: homework.id,
            class_id: homework.class_id,
            subject_id: homework.subject_id,
            teacher_id: homework.teacher_id,
            title: homework.title,
            description: homework.description,
            file_path: homework.file_path,
            created_at,
        }
    }
}

#[derive(Serialize)]
struct StudentHomeworkView {
    id: i64,
    class_id: i64,
    subject_id: i64,
    subject_name: String,
    teacher_name: String,
    title: String,
    description: Option<String>,
    file_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StudentHomework> for StudentHomeworkView {
    fn from(row: StudentHomework) -> Self {
        Self {
            id: row.id,
            class_id: row.class_id,
            subject_id: row.subject_id,
            subject_name: row.subject_name.unwrap_or_else(|| "Unknown".to_string()),
            teacher_name: row.teacher_name.unwrap_or_else(|| "Unknown".to_string()),
            title: row.title,
            description: row.description,
            file_path: row.file_path,
            created_at: row.created_at,
        }
    }
}

pub async fn add_homework(state: web::Data<AppState>, body: web::Json<HomeworkRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(teacher_id), Some(class_id), Some(title)) =
        (body.teacher_id, body.class_id, present(body.title))
    else {
        return Err(ApiError::bad_request("teacher_id, class_id, and title are required"));
    };

    let class = state
        .db
        .find_class(class_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;
    if state.db.find_teacher(teacher_id).await?.is_none() {
        return Err(ApiError::not_found("Teacher not found"));
    }

    let description = present(body.description);
    let file_path = present(body.file_path);
    let homework_id = state
        .db
        .insert_homework(NewHomework {
            class_id,
            subject_id: class.subject_id,
            teacher_id,
            title: &title,
            description: description.as_deref(),
            file_path: file_path.as_deref(),
        })
        .await?;

    log::info!("teacher {teacher_id} posted homework {homework_id} to class {class_id}");
    Ok(HttpResponse::Created().json(json!({
        "message": "Homework posted successfully!",
        "homework_id": homework_id,
    })))
}

pub async fn class_homework(state: web::Data<AppState>, query: web::Query<ClassQuery>) -> ApiResult<HttpResponse> {
    let class_id = require(query.into_inner().class_id, "class_id is required")?;
    let homework: Vec<HomeworkView> = state
        .db
        .homework_for_class(class_id)
        .await?
        .into_iter()
        .map(|h| {
            let day = h.created_at.format("%Y-%m-%d").to_string();
            HomeworkView::new(h, day)
        })
        .collect();
    Ok(HttpResponse::Ok().json(homework))
}

/// Homework the teacher posted in the subject taught by `class_id`.
pub async fn teacher_homework(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ClassQuery>,
) -> ApiResult<HttpResponse> {
    let teacher_id = path.into_inner();
    let class_id = require(query.into_inner().class_id, "Missing class_id")?;

    if state.db.find_teacher(teacher_id).await?.is_none() {
        return Err(ApiError::not_found("Teacher not found"));
    }
    let Some(class) = state.db.find_class(class_id).await? else {
        return Ok(HttpResponse::Ok().json(Vec::<HomeworkView>::new()));
    };

    let homework: Vec<HomeworkView> = state
        .db
        .homework_for_teacher_subject(teacher_id, class.subject_id)
        .await?
        .into_iter()
        .map(|h| {
            let stamp = h.created_at.to_rfc3339();
            HomeworkView::new(h, stamp)
        })
        .collect();
    Ok(HttpResponse::Ok().json(homework))
}

pub async fn delete_homework(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let homework_id = path.into_inner();
    if state.db.find_homework(homework_id).await?.is_none() {
        return Err(ApiError::not_found("Homework not found"));
    }
    state.db.delete_homework(homework_id).await?;
    log::info!("deleted homework {homework_id}");
    Ok(HttpResponse::Ok().json(ack("Homework deleted successfully!")))
}

pub async fn student_homework(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let homework: Vec<StudentHomeworkView> = state
        .db
        .homework_for_student(path.into_inner())
        .await?
        .into_iter()
        .map(StudentHomeworkView::from)
        .collect();
    Ok(HttpResponse::Ok().json(homework))
}
