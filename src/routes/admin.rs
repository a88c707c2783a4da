use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{ack, present, AppState};
use crate::database::{NewAccount, Role, UserChanges};
use crate::error::{ApiError, ApiResult};
use crate::password::hash_password;

#[derive(Debug, Deserialize)]
pub struct TeacherRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    subject_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StudentRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    #[serde(default)]
    subjects: Vec<i64>,
}

async fn ensure_subject(state: &AppState, subject_id: i64) -> ApiResult<()> {
    match state.db.find_subject(subject_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found(format!("Subject {subject_id} not found"))),
    }
}

async fn ensure_email_free(state: &AppState, email: &str, owner: Option<i64>) -> ApiResult<()> {
    match state.db.find_user_by_email(email).await? {
        Some(user) if Some(user.id) != owner => Err(ApiError::bad_request("Email already exists")),
        _ => Ok(()),
    }
}

/// Subject ids in request order without repeats. Each must exist and have a
/// teacher, since placing a student may open a new class for it.
async fn enrollable_subjects(state: &AppState, requested: Vec<i64>) -> ApiResult<Vec<i64>> {
    let mut subjects = Vec::with_capacity(requested.len());
    for subject_id in requested {
        if subjects.contains(&subject_id) {
            continue;
        }
        ensure_subject(state, subject_id).await?;
        if state.db.first_teacher_for_subject(subject_id).await?.is_none() {
            return Err(ApiError::bad_request(format!(
                "No teacher assigned to subject {subject_id}"
            )));
        }
        subjects.push(subject_id);
    }
    Ok(subjects)
}

fn changes(name: Option<String>, email: Option<String>, password: Option<String>) -> UserChanges {
    UserChanges {
        name: present(name),
        email: present(email),
        password_hash: present(password).map(|p| hash_password(&p)),
    }
}

pub async fn add_teacher(state: web::Data<AppState>, body: web::Json<TeacherRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(name), Some(email), Some(password), Some(subject_id)) = (
        present(body.name),
        present(body.email),
        present(body.password),
        body.subject_id,
    ) else {
        return Err(ApiError::bad_request(
            "Name, email, password, and subject_id are required",
        ));
    };

    ensure_email_free(&state, &email, None).await?;
    ensure_subject(&state, subject_id).await?;

    let password_hash = hash_password(&password);
    let teacher_id = state
        .db
        .create_teacher(
            NewAccount {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Teacher,
            },
            subject_id,
        )
        .await?;

    log::info!("added teacher {teacher_id} for subject {subject_id}");
    Ok(HttpResponse::Created().json(json!({
        "message": "Teacher added successfully!",
        "teacher_id": teacher_id,
    })))
}

pub async fn update_teacher(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<TeacherRequest>,
) -> ApiResult<HttpResponse> {
    let teacher_id = path.into_inner();
    let body = body.into_inner();

    let teacher = state
        .db
        .find_teacher(teacher_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found"))?;
    if state.db.find_user(teacher.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let changes = changes(body.name, body.email, body.password);
    if let Some(email) = &changes.email {
        ensure_email_free(&state, email, Some(teacher.user_id)).await?;
    }
    if let Some(subject_id) = body.subject_id {
        ensure_subject(&state, subject_id).await?;
    }

    state.db.update_user(teacher.user_id, &changes).await?;
    if let Some(subject_id) = body.subject_id {
        state.db.set_teacher_subject(teacher_id, subject_id).await?;
    }

    log::info!("updated teacher {teacher_id}");
    Ok(HttpResponse::Ok().json(ack("Teacher updated successfully!")))
}

pub async fn delete_teacher(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let teacher_id = path.into_inner();
    let teacher = state
        .db
        .find_teacher(teacher_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found"))?;

    state.db.delete_user(teacher.user_id).await?;
    log::info!("deleted teacher {teacher_id}");
    Ok(HttpResponse::Ok().json(ack("Teacher deleted successfully!")))
}

pub async fn add_student(state: web::Data<AppState>, body: web::Json<StudentRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(name), Some(email), Some(password)) =
        (present(body.name), present(body.email), present(body.password))
    else {
        return Err(ApiError::bad_request("Name, email, and password are required"));
    };

    ensure_email_free(&state, &email, None).await?;
    let subjects = enrollable_subjects(&state, body.subjects).await?;

    let password_hash = hash_password(&password);
    let student_id = state
        .db
        .create_student(
            NewAccount {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Student,
            },
            &subjects,
        )
        .await?;

    log::info!("added student {student_id} in {} subjects", subjects.len());
    Ok(HttpResponse::Created().json(json!({
        "message": "Student added successfully!",
        "student_id": student_id,
    })))
}

pub async fn update_student(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StudentRequest>,
) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();
    let body = body.into_inner();

    let student = state
        .db
        .find_student(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;
    if state.db.find_user(student.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let changes = changes(body.name, body.email, body.password);
    if let Some(email) = &changes.email {
        ensure_email_free(&state, email, Some(student.user_id)).await?;
    }
    let subjects = enrollable_subjects(&state, body.subjects).await?;

    state.db.update_user(student.user_id, &changes).await?;
    if !subjects.is_empty() {
        state.db.replace_enrollments(student_id, &subjects).await?;
    }

    log::info!("updated student {student_id}");
    Ok(HttpResponse::Ok().json(ack("Student updated successfully!")))
}

pub async fn delete_student(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();
    let student = state
        .db
        .find_student(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    state.db.delete_user(student.user_id).await?;
    log::info!("deleted student {student_id}");
    Ok(HttpResponse::Ok().json(ack("Student deleted successfully!")))
}
