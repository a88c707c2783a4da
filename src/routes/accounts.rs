use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{ack, present, AppState};
use crate::database::{NewAccount, Role};
use crate::error::{ApiError, ApiResult};
use crate::password::{hash_password, verify_password};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    user_id: i64,
    name: String,
    role: Role,
    teacher_id: Option<i64>,
    student_id: Option<i64>,
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .filter(|user| verify_password(&password, &user.password))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let teacher_id = match user.role {
        Role::Teacher => state.db.teacher_for_user(user.id).await?.map(|t| t.id),
        _ => None,
    };
    let student_id = match user.role {
        Role::Student => state.db.student_for_user(user.id).await?.map(|s| s.id),
        _ => None,
    };

    log::info!("user {} logged in as {}", user.id, user.role);
    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful!",
        user_id: user.id,
        name: user.name,
        role: user.role,
        teacher_id,
        student_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

fn capitalized(role: Role) -> String {
    let name = role.as_str();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(name), Some(email), Some(password)) =
        (present(body.name), present(body.email), present(body.password))
    else {
        return Err(ApiError::bad_request("Missing fields"));
    };
    let role = match present(body.role) {
        None => Role::Student,
        Some(raw) => raw.parse::<Role>().map_err(|_| ApiError::bad_request("Invalid role"))?,
    };

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already exists"));
    }

    let password_hash = hash_password(&password);
    let ids = state
        .db
        .create_account(NewAccount {
            name: &name,
            email: &email,
            password_hash: &password_hash,
            role,
        })
        .await?;

    log::info!("registered user {} as {role}", ids.user_id);
    Ok(HttpResponse::Created().json(ack(format!("{} registered successfully!", capitalized(role)))))
}
