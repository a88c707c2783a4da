use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{ack, present, AppState};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    student_id: Option<i64>,
    subject_id: Option<i64>,
    exam_type: Option<String>,
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GradeQuery {
    student_id: Option<i64>,
    subject_id: Option<i64>,
    exam_type: Option<String>,
}

#[derive(Serialize)]
struct GradeView {
    student_id: i64,
    subject_id: i64,
    exam_type: String,
    score: f64,
}

struct ValidGrade {
    student_id: i64,
    subject_id: i64,
    exam_type: String,
    score: f64,
}

fn validate(body: GradeRequest) -> ApiResult<ValidGrade> {
    let (Some(student_id), Some(subject_id), Some(exam_type), Some(score)) =
        (body.student_id, body.subject_id, present(body.exam_type), body.score)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if !(0.0..=100.0).contains(&score) {
        return Err(ApiError::bad_request("Score must be between 0 and 100"));
    }
    Ok(ValidGrade {
        student_id,
        subject_id,
        exam_type,
        score,
    })
}

pub async fn add_grade(state: web::Data<AppState>, body: web::Json<GradeRequest>) -> ApiResult<HttpResponse> {
    let grade = validate(body.into_inner())?;

    if state.db.find_student(grade.student_id).await?.is_none() {
        return Err(ApiError::not_found("Student not found"));
    }
    if state.db.find_subject(grade.subject_id).await?.is_none() {
        return Err(ApiError::not_found("Subject not found"));
    }
    if state
        .db
        .find_grade(grade.student_id, grade.subject_id, &grade.exam_type)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(
            "Grade record already exists. Use update grade endpoint.",
        ));
    }

    let grade_id = state
        .db
        .insert_grade(grade.student_id, grade.subject_id, &grade.exam_type, grade.score)
        .await?;
    log::info!(
        "grade {grade_id}: student {} subject {} {} = {}",
        grade.student_id,
        grade.subject_id,
        grade.exam_type,
        grade.score
    );
    Ok(HttpResponse::Created().json(ack("Grade added successfully!")))
}

pub async fn update_grade(state: web::Data<AppState>, body: web::Json<GradeRequest>) -> ApiResult<HttpResponse> {
    let grade = validate(body.into_inner())?;

    let existing = state
        .db
        .find_grade(grade.student_id, grade.subject_id, &grade.exam_type)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade record not found"))?;

    state.db.update_grade_score(existing.id, grade.score).await?;
    log::info!("grade {} updated from {} to {}", existing.id, existing.score, grade.score);
    Ok(HttpResponse::Ok().json(ack("Grade updated successfully!")))
}

pub async fn existing_grade(state: web::Data<AppState>, query: web::Query<GradeQuery>) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let (Some(student_id), Some(subject_id), Some(exam_type)) =
        (query.student_id, query.subject_id, present(query.exam_type))
    else {
        return Err(ApiError::bad_request("Missing required query parameters"));
    };

    let grade = state
        .db
        .find_grade(student_id, subject_id, &exam_type)
        .await?
        .ok_or_else(|| ApiError::not_found("Grade not found"))?;

    Ok(HttpResponse::Ok().json(GradeView {
        student_id: grade.student_id,
        subject_id: grade.subject_id,
        exam_type: grade.exam_type,
        score: grade.score,
    }))
}
