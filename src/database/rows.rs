use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl FromStr for AttendanceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            "Late" => Ok(AttendanceStatus::Late),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Teacher {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Class {
    pub id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub class_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub status: AttendanceStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GradeRecord {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub exam_type: String,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipationRecord {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub week_number: i64,
    pub participation_score: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Homework {
    pub id: i64,
    pub class_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}

// Joined views returned by list endpoints.

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StudentProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeacherProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeacherClass {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub class_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassMember {
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeacherStudent {
    pub student_table_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StudentTeacher {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentHomework {
    pub id: i64,
    pub class_id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub teacher_id: i64,
    pub teacher_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}
