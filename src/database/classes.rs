use chrono::Utc;
use sqlx::SqliteConnection;

use super::{
    Class, ClassMember, Database, StudentTeacher, Subject, TeacherClass, TeacherStudent,
};

/// Maximum enrollments per class before a new class is opened for the subject.
pub const CLASS_CAPACITY: i64 = 20;

pub(super) async fn insert_class(
    conn: &mut SqliteConnection,
    subject_id: i64,
    teacher_id: i64,
    class_number: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO classes (subject_id, teacher_id, class_number, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(subject_id)
    .bind(teacher_id)
    .bind(class_number)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// First class of the subject (by class number) with a free seat, or a new
/// class numbered after the last one. The new class goes to the subject's
/// first teacher; with no teacher for the subject this fails with
/// `RowNotFound`.
async fn class_with_free_seat(conn: &mut SqliteConnection, subject_id: i64) -> Result<i64, sqlx::Error> {
    let open: Option<i64> = sqlx::query_scalar(
        "SELECT c.id
         FROM classes c LEFT JOIN student_subjects ss ON ss.class_id = c.id
         WHERE c.subject_id = ?
         GROUP BY c.id
         HAVING COUNT(ss.id) < ?
         ORDER BY c.class_number, c.id
         LIMIT 1",
    )
    .bind(subject_id)
    .bind(CLASS_CAPACITY)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(class_id) = open {
        return Ok(class_id);
    }

    let next_number: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(class_number), 0) + 1 FROM classes WHERE subject_id = ?")
            .bind(subject_id)
            .fetch_one(&mut *conn)
            .await?;
    let teacher_id: i64 =
        sqlx::query_scalar("SELECT id FROM teachers WHERE subject_id = ? ORDER BY id LIMIT 1")
            .bind(subject_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

    log::info!("opening class {next_number} for subject {subject_id}");
    insert_class(conn, subject_id, teacher_id, next_number).await
}

pub(super) async fn enroll_in_subjects(
    conn: &mut SqliteConnection,
    student_id: i64,
    subjects: &[i64],
) -> Result<(), sqlx::Error> {
    for &subject_id in subjects {
        let class_id = class_with_free_seat(conn, subject_id).await?;
        sqlx::query("INSERT INTO student_subjects (student_id, subject_id, class_id) VALUES (?, ?, ?)")
            .bind(student_id)
            .bind(subject_id)
            .bind(class_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl Database {
    pub async fn list_subjects(&self) -> Result<Vec<Subject>, sqlx::Error> {
        sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>, sqlx::Error> {
        sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE id = ?")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_subject_by_name(&self, name: &str) -> Result<Option<Subject>, sqlx::Error> {
        sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_subject(&self, name: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO subjects (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_class(&self, class_id: i64) -> Result<Option<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>(
            "SELECT id, subject_id, teacher_id, class_number, created_at FROM classes WHERE id = ?",
        )
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn classes_for_teacher(&self, teacher_id: i64) -> Result<Vec<TeacherClass>, sqlx::Error> {
        sqlx::query_as::<_, TeacherClass>(
            "SELECT c.id, c.subject_id, s.name AS subject_name, c.class_number, c.created_at
             FROM classes c LEFT JOIN subjects s ON s.id = c.subject_id
             WHERE c.teacher_id = ?
             ORDER BY c.subject_id, c.class_number",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Opens the next class for this teacher in this subject. Returns the
    /// new class id and its number.
    pub async fn open_class(&self, teacher_id: i64, subject_id: i64) -> Result<(i64, i64), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let next_number: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(class_number), 0) + 1 FROM classes WHERE teacher_id = ? AND subject_id = ?",
        )
        .bind(teacher_id)
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await?;
        let class_id = insert_class(&mut tx, subject_id, teacher_id, next_number).await?;
        tx.commit().await?;
        Ok((class_id, next_number))
    }

    pub async fn students_in_class(&self, class_id: i64) -> Result<Vec<ClassMember>, sqlx::Error> {
        sqlx::query_as::<_, ClassMember>(
            "SELECT s.id AS student_id, u.name AS student_name, u.email AS student_email
             FROM student_subjects ss
             JOIN students s ON s.id = ss.student_id
             JOIN users u ON u.id = s.user_id
             WHERE ss.class_id = ?
             ORDER BY ss.id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct students enrolled in any of the teacher's classes.
    pub async fn students_of_teacher(&self, teacher_id: i64) -> Result<Vec<TeacherStudent>, sqlx::Error> {
        sqlx::query_as::<_, TeacherStudent>(
            "SELECT DISTINCT s.id AS student_table_id, u.id AS user_id, u.name, u.email
             FROM classes c
             JOIN student_subjects ss ON ss.class_id = c.id
             JOIN students s ON s.id = ss.student_id
             JOIN users u ON u.id = s.user_id
             WHERE c.teacher_id = ?
             ORDER BY s.id",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn subjects_for_student(&self, student_id: i64) -> Result<Vec<Subject>, sqlx::Error> {
        sqlx::query_as::<_, Subject>(
            "SELECT DISTINCT sub.id, sub.name
             FROM student_subjects ss JOIN subjects sub ON sub.id = ss.subject_id
             WHERE ss.student_id = ?
             ORDER BY sub.id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn teachers_for_student(&self, student_id: i64) -> Result<Vec<StudentTeacher>, sqlx::Error> {
        sqlx::query_as::<_, StudentTeacher>(
            "SELECT DISTINCT t.id, u.name, u.id AS user_id
             FROM student_subjects ss
             JOIN classes c ON c.id = ss.class_id
             JOIN teachers t ON t.id = c.teacher_id
             JOIN users u ON u.id = t.user_id
             WHERE ss.student_id = ?
             ORDER BY t.id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Drops the student's enrollments and re-places them in `subjects`.
    pub async fn replace_enrollments(&self, student_id: i64, subjects: &[i64]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM student_subjects WHERE student_id = ?")
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        enroll_in_subjects(&mut tx, student_id, subjects).await?;
        tx.commit().await?;
        Ok(())
    }
}
