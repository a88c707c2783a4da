use chrono::{DateTime, Utc};

use super::{Database, Homework, StudentHomework};

const HOMEWORK_COLUMNS: &str =
    "id, class_id, subject_id, teacher_id, title, description, file_path, created_at";

#[derive(Debug, Clone)]
pub struct NewHomework<'a> {
    pub class_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub file_path: Option<&'a str>,
}

impl Database {
    pub async fn insert_homework(&self, homework: NewHomework<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO homework (class_id, subject_id, teacher_id, title, description, file_path, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(homework.class_id)
        .bind(homework.subject_id)
        .bind(homework.teacher_id)
        .bind(homework.title)
        .bind(homework.description)
        .bind(homework.file_path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_homework(&self, homework_id: i64) -> Result<Option<Homework>, sqlx::Error> {
        sqlx::query_as::<_, Homework>(&format!("SELECT {HOMEWORK_COLUMNS} FROM homework WHERE id = ?"))
            .bind(homework_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_homework(&self, homework_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM homework WHERE id = ?")
            .bind(homework_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn homework_for_class(&self, class_id: i64) -> Result<Vec<Homework>, sqlx::Error> {
        sqlx::query_as::<_, Homework>(&format!(
            "SELECT {HOMEWORK_COLUMNS} FROM homework WHERE class_id = ? ORDER BY id"
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Homework the teacher posted in the subject, across all their classes.
    pub async fn homework_for_teacher_subject(
        &self,
        teacher_id: i64,
        subject_id: i64,
    ) -> Result<Vec<Homework>, sqlx::Error> {
        sqlx::query_as::<_, Homework>(&format!(
            "SELECT {HOMEWORK_COLUMNS} FROM homework WHERE teacher_id = ? AND subject_id = ? ORDER BY id"
        ))
        .bind(teacher_id)
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Homework posted to any class the student is enrolled in, with subject
    /// and teacher names resolved.
    pub async fn homework_for_student(&self, student_id: i64) -> Result<Vec<StudentHomework>, sqlx::Error> {
        sqlx::query_as::<_, StudentHomework>(
            "SELECT h.id, h.class_id, h.subject_id, s.name AS subject_name, h.teacher_id,
                    u.name AS teacher_name, h.title, h.description, h.file_path, h.created_at
             FROM homework h
             LEFT JOIN subjects s ON s.id = h.subject_id
             LEFT JOIN teachers t ON t.id = h.teacher_id
             LEFT JOIN users u ON u.id = t.user_id
             WHERE h.class_id IN (SELECT class_id FROM student_subjects WHERE student_id = ?)
             ORDER BY h.id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Homework created since `since` in any subject the student takes.
    pub async fn homework_posted_since(
        &self,
        student_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Homework>, sqlx::Error> {
        sqlx::query_as::<_, Homework>(&format!(
            "SELECT {HOMEWORK_COLUMNS} FROM homework
             WHERE subject_id IN (SELECT subject_id FROM student_subjects WHERE student_id = ?)
               AND created_at >= ?
             ORDER BY id"
        ))
        .bind(student_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }
}
