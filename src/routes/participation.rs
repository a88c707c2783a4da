use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ack, AppState};
use crate::error::{ApiError, ApiResult};

const MAX_PARTICIPATION_SCORE: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct ParticipationMark {
    student_id: Option<i64>,
    participation_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipationRequest {
    class_id: Option<i64>,
    teacher_id: Option<i64>,
    week_number: Option<i64>,
    #[serde(default)]
    records: Vec<ParticipationMark>,
    #[serde(default)]
    force_update: bool,
}

#[derive(Debug, Serialize)]
struct Duplicate {
    student_id: i64,
    student_name: String,
    existing_score: f64,
}

pub async fn add_participation(
    state: web::Data<AppState>,
    body: web::Json<ParticipationRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(class_id), Some(_teacher_id), Some(week_number)) =
        (body.class_id, body.teacher_id, body.week_number)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if body.records.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let class = state
        .db
        .find_class(class_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;

    let mut inserts = Vec::new();
    let mut overwrites = Vec::new();
    let mut duplicates = Vec::new();
    for record in body.records {
        let (Some(student_id), Some(score)) = (record.student_id, record.participation_score) else {
            return Err(ApiError::bad_request(
                "Each record must include student_id and participation_score",
            ));
        };
        if !(0.0..=MAX_PARTICIPATION_SCORE).contains(&score) {
            return Err(ApiError::bad_request("Participation score must be between 0 and 10"));
        }
        if state.db.find_student(student_id).await?.is_none() {
            return Err(ApiError::not_found(format!("Student {student_id} not found")));
        }

        match state
            .db
            .find_participation(student_id, class.subject_id, week_number)
            .await?
        {
            Some(existing) => {
                let student_name = state
                    .db
                    .student_name(student_id)
                    .await?
                    .unwrap_or_else(|| "Unknown".to_string());
                duplicates.push(Duplicate {
                    student_id,
                    student_name,
                    existing_score: existing.participation_score,
                });
                overwrites.push((existing.id, score));
            }
            None => inserts.push((student_id, score)),
        }
    }

    if !duplicates.is_empty() && !body.force_update {
        log::warn!(
            "participation for week {week_number} in class {class_id} already exists for {} students",
            duplicates.len()
        );
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": format!("Participation for week {week_number} already exists for some students."),
            "duplicates": duplicates,
        })));
    }

    state
        .db
        .save_participation(class.subject_id, week_number, &inserts, &overwrites)
        .await?;
    log::info!(
        "participation week {week_number} class {class_id}: {} new, {} overwritten",
        inserts.len(),
        overwrites.len()
    );

    if body.force_update {
        Ok(HttpResponse::Ok().json(ack("Participation records updated successfully!")))
    } else {
        Ok(HttpResponse::Created().json(ack("Participation recorded successfully!")))
    }
}
