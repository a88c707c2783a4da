use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiResult;
use crate::features::student_features;

const NO_DATA_MESSAGE: &str = "No performance data available yet. Check back later once data is added.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub student_id: i64,
    pub attendance_percent: f64,
    pub participation_percent: f64,
    pub past_grade: f64,
    pub predicted_final_grade: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Predicted final grade from the student's recorded data. A student with
/// nothing recorded (including an unknown id) gets an all-zero answer and
/// the model is not consulted.
pub async fn predict_student(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();
    let features = student_features(&state.db, student_id).await?;

    if features.is_empty() {
        log::info!("student {student_id} has no performance data; skipping prediction");
        return Ok(HttpResponse::Ok().json(PredictionResponse {
            student_id,
            attendance_percent: 0.0,
            participation_percent: 0.0,
            past_grade: 0.0,
            predicted_final_grade: 0.0,
            message: Some(NO_DATA_MESSAGE.to_string()),
        }));
    }

    let predicted = state.model.predict(&features)?;
    log::info!("student {student_id} predicted final grade {predicted:.2}");
    Ok(HttpResponse::Ok().json(PredictionResponse {
        student_id,
        attendance_percent: features.attendance_percent,
        participation_percent: features.participation_percent,
        past_grade: features.past_grade,
        predicted_final_grade: predicted,
        message: None,
    }))
}
