use chrono::{DateTime, Utc};

use super::{AttendanceRecord, AttendanceStatus, Database, GradeRecord, ParticipationRecord};

const GRADE_COLUMNS: &str = "id, student_id, subject_id, exam_type, score, recorded_at";
const PARTICIPATION_COLUMNS: &str =
    "id, student_id, subject_id, week_number, participation_score, recorded_at";

impl Database {
    /// Writes one attendance mark per `(student_id, status)` pair for the
    /// subject, all or nothing.
    pub async fn record_attendance(
        &self,
        subject_id: i64,
        marks: &[(i64, AttendanceStatus)],
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for &(student_id, status) in marks {
            sqlx::query(
                "INSERT INTO attendance (student_id, subject_id, status, recorded_at) VALUES (?, ?, ?, ?)",
            )
            .bind(student_id)
            .bind(subject_id)
            .bind(status)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// Every attendance mark of the student, across all subjects.
    pub async fn attendance_for_student(&self, student_id: i64) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, student_id, subject_id, status, recorded_at
             FROM attendance WHERE student_id = ? ORDER BY id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Every grade of the student, any subject and any exam type.
    pub async fn grades_for_student(&self, student_id: i64) -> Result<Vec<GradeRecord>, sqlx::Error> {
        sqlx::query_as::<_, GradeRecord>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE student_id = ? ORDER BY id"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_grade(
        &self,
        student_id: i64,
        subject_id: i64,
        exam_type: &str,
    ) -> Result<Option<GradeRecord>, sqlx::Error> {
        sqlx::query_as::<_, GradeRecord>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades
             WHERE student_id = ? AND subject_id = ? AND exam_type = ?
             ORDER BY id LIMIT 1"
        ))
        .bind(student_id)
        .bind(subject_id)
        .bind(exam_type)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_grade(
        &self,
        student_id: i64,
        subject_id: i64,
        exam_type: &str,
        score: f64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO grades (student_id, subject_id, exam_type, score, recorded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(student_id)
        .bind(subject_id)
        .bind(exam_type)
        .bind(score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrites the score and stamps the row as recently changed, so the
    /// student's grade notification picks it up.
    pub async fn update_grade_score(&self, grade_id: i64, score: f64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE grades SET score = ?, recorded_at = ? WHERE id = ?")
            .bind(score)
            .bind(Utc::now())
            .bind(grade_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn grades_recorded_since(
        &self,
        student_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<GradeRecord>, sqlx::Error> {
        sqlx::query_as::<_, GradeRecord>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE student_id = ? AND recorded_at >= ? ORDER BY id"
        ))
        .bind(student_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    /// Every participation score of the student, across all subjects.
    pub async fn participation_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<ParticipationRecord>, sqlx::Error> {
        sqlx::query_as::<_, ParticipationRecord>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participation WHERE student_id = ? ORDER BY id"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_participation(
        &self,
        student_id: i64,
        subject_id: i64,
        week_number: i64,
    ) -> Result<Option<ParticipationRecord>, sqlx::Error> {
        sqlx::query_as::<_, ParticipationRecord>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participation
             WHERE student_id = ? AND subject_id = ? AND week_number = ?
             ORDER BY id LIMIT 1"
        ))
        .bind(student_id)
        .bind(subject_id)
        .bind(week_number)
        .fetch_optional(&self.pool)
        .await
    }

    /// Inserts new weekly scores and overwrites existing rows by id in one
    /// transaction.
    pub async fn save_participation(
        &self,
        subject_id: i64,
        week_number: i64,
        inserts: &[(i64, f64)],
        overwrites: &[(i64, f64)],
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for &(student_id, score) in inserts {
            sqlx::query(
                "INSERT INTO participation (student_id, subject_id, week_number, participation_score, recorded_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(student_id)
            .bind(subject_id)
            .bind(week_number)
            .bind(score)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        for &(record_id, score) in overwrites {
            sqlx::query("UPDATE participation SET participation_score = ?, recorded_at = ? WHERE id = ?")
                .bind(score)
                .bind(now)
                .bind(record_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }
}
