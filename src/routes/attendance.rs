use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{ack, present, AppState};
use crate::database::AttendanceStatus;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AttendanceMark {
    student_id: Option<i64>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    class_id: Option<i64>,
    teacher_id: Option<i64>,
    #[serde(default)]
    records: Vec<AttendanceMark>,
}

pub async fn add_attendance(state: web::Data<AppState>, body: web::Json<AttendanceRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(class_id), Some(teacher_id)) = (body.class_id, body.teacher_id) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if body.records.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let class = state
        .db
        .find_class(class_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid class_id"))?;
    if class.teacher_id != teacher_id {
        return Err(ApiError::Forbidden("Teacher does not match the class".to_string()));
    }

    // Every mark is checked before any is written.
    let mut marks = Vec::with_capacity(body.records.len());
    for record in body.records {
        let (Some(student_id), Some(status)) = (record.student_id, present(record.status)) else {
            return Err(ApiError::bad_request("Each record must include student_id and status"));
        };
        let status = status
            .parse::<AttendanceStatus>()
            .map_err(|_| ApiError::bad_request("Invalid attendance status"))?;
        if state.db.find_student(student_id).await?.is_none() {
            return Err(ApiError::not_found(format!("Student {student_id} not found")));
        }
        marks.push((student_id, status));
    }

    state.db.record_attendance(class.subject_id, &marks).await?;
    log::info!(
        "recorded {} attendance marks for class {class_id} (subject {})",
        marks.len(),
        class.subject_id
    );
    Ok(HttpResponse::Created().json(ack("Attendance recorded successfully!")))
}
