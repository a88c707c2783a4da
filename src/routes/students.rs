use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{ack, present, AppState};
use crate::database::Student;
use crate::error::{ApiError, ApiResult};
use crate::features::{attendance_rate, average_participation, overall_grade_average};
use crate::notifications::{build_notifications, recent_window, RecentActivity};

async fn existing_student(state: &AppState, student_id: i64) -> ApiResult<Student> {
    state
        .db
        .find_student(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))
}

pub async fn subjects(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student = existing_student(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.db.subjects_for_student(student.id).await?))
}

pub async fn teachers(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student = existing_student(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.db.teachers_for_student(student.id).await?))
}

#[derive(Serialize)]
struct ExamRecord {
    exam_type: String,
    score: f64,
}

#[derive(Serialize)]
struct SubjectGrades {
    subject_id: i64,
    subject_name: String,
    #[serde(rename = "examRecords")]
    exam_records: Vec<ExamRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GradesOverview {
    avg_attendance: f64,
    avg_participation: f64,
    avg_grade: f64,
    subjects: Vec<SubjectGrades>,
}

/// Dashboard summary. `avgGrade` covers every exam type, unlike the
/// past-grade model feature.
pub async fn grades_overview(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();

    let attendance = state.db.attendance_for_student(student_id).await?;
    let participation = state.db.participation_for_student(student_id).await?;
    let grades = state.db.grades_for_student(student_id).await?;

    let subjects = state
        .db
        .subjects_for_student(student_id)
        .await?
        .into_iter()
        .map(|subject| SubjectGrades {
            subject_id: subject.id,
            exam_records: grades
                .iter()
                .filter(|g| g.subject_id == subject.id)
                .map(|g| ExamRecord {
                    exam_type: g.exam_type.clone(),
                    score: g.score,
                })
                .collect(),
            subject_name: subject.name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(GradesOverview {
        avg_attendance: attendance_rate(&attendance),
        avg_participation: average_participation(&participation),
        avg_grade: overall_grade_average(&grades),
        subjects,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    after: Option<String>,
}

/// Accepts RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_after(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub async fn notifications(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<NotificationQuery>,
) -> ApiResult<HttpResponse> {
    let student = existing_student(&state, path.into_inner()).await?;
    let after = match present(query.into_inner().after) {
        Some(raw) => Some(
            parse_after(raw.trim()).ok_or_else(|| ApiError::bad_request("Invalid 'after' timestamp format."))?,
        ),
        None => None,
    };

    let since = Utc::now() - recent_window();
    let activity = RecentActivity {
        messages: state
            .db
            .messages_received_since(student.user_id, since)
            .await?
            .into_iter()
            .map(|m| m.sent_at)
            .collect(),
        homework: state
            .db
            .homework_posted_since(student.id, since)
            .await?
            .into_iter()
            .map(|h| h.created_at)
            .collect(),
        grades: state
            .db
            .grades_recorded_since(student.id, since)
            .await?
            .into_iter()
            .map(|g| g.recorded_at)
            .collect(),
    };

    Ok(HttpResponse::Ok().json(build_notifications(&activity, after)))
}

/// Nothing is stored per notification; this only confirms the student.
pub async fn clear_notifications(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let student = existing_student(&state, path.into_inner()).await?;
    log::debug!("notifications cleared for student {}", student.id);
    Ok(HttpResponse::Ok().json(ack("Notifications cleared successfully!")))
}
