use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ack, present, AppState};
use crate::database::Message;
use crate::error::{ApiError, ApiResult};

/// The two parties of a teacher/student conversation, as user ids.
#[derive(Debug, Deserialize)]
pub struct Participants {
    teacher_id: Option<i64>,
    student_id: Option<i64>,
}

impl Participants {
    fn both(self) -> ApiResult<(i64, i64)> {
        match (self.teacher_id, self.student_id) {
            (Some(teacher), Some(student)) => Ok((teacher, student)),
            _ => Err(ApiError::bad_request("Missing teacher_id or student_id in query")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    sender_id: Option<i64>,
    receiver_id: Option<i64>,
    message: Option<String>,
}

#[derive(Serialize)]
struct MessageView {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    message: String,
    timestamp: DateTime<Utc>,
    is_read: bool,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            message: m.message,
            timestamp: m.sent_at,
            is_read: m.is_read,
        }
    }
}

pub async fn conversation(state: web::Data<AppState>, query: web::Query<Participants>) -> ApiResult<HttpResponse> {
    let (teacher, student) = query.into_inner().both()?;
    let messages: Vec<MessageView> = state
        .db
        .conversation(teacher, student)
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn send_message(state: web::Data<AppState>, body: web::Json<SendRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(sender_id), Some(receiver_id), Some(text)) =
        (body.sender_id, body.receiver_id, present(body.message))
    else {
        return Err(ApiError::bad_request("Missing fields"));
    };

    if state.db.find_user(sender_id).await?.is_none() || state.db.find_user(receiver_id).await?.is_none() {
        return Err(ApiError::bad_request("Invalid sender or receiver ID"));
    }

    let message_id = state.db.insert_message(sender_id, receiver_id, &text).await?;
    log::debug!("message {message_id} from user {sender_id} to user {receiver_id}");
    Ok(HttpResponse::Created().json(ack("Message sent!")))
}

/// The teacher has read what the student sent.
pub async fn mark_read_by_teacher(state: web::Data<AppState>, body: web::Json<Participants>) -> ApiResult<HttpResponse> {
    let (teacher, student) = body.into_inner().both()?;
    let updated = state.db.mark_read(student, teacher).await?;
    log::debug!("teacher user {teacher} read {updated} messages from user {student}");
    Ok(HttpResponse::Ok().json(ack("Messages marked as read!")))
}

/// The student has read what the teacher sent.
pub async fn mark_read_by_student(state: web::Data<AppState>, body: web::Json<Participants>) -> ApiResult<HttpResponse> {
    let (teacher, student) = body.into_inner().both()?;
    let updated = state.db.mark_read(teacher, student).await?;
    log::debug!("student user {student} read {updated} messages from user {teacher}");
    Ok(HttpResponse::Ok().json(ack("Messages marked as read!")))
}

pub async fn unread_for_student(state: web::Data<AppState>, query: web::Query<Participants>) -> ApiResult<HttpResponse> {
    let (teacher, student) = query.into_inner().both()?;
    let unread = state.db.unread_count(teacher, student).await?;
    Ok(HttpResponse::Ok().json(json!({ "unread_count": unread })))
}

pub async fn unread_for_teacher(state: web::Data<AppState>, query: web::Query<Participants>) -> ApiResult<HttpResponse> {
    let (teacher, student) = query.into_inner().both()?;
    let unread = state.db.unread_count(student, teacher).await?;
    Ok(HttpResponse::Ok().json(json!({ "unread_count": unread })))
}
