//! SQLite persistence for the school backend.
//!
//! Every table is created on connect. Queries live next to the entity they
//! serve (`people`, `classes`, `tracking`, `homework`, `messages`); row types
//! are in `rows`.

mod classes;
mod homework;
mod messages;
mod people;
mod rows;
mod tracking;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use classes::CLASS_CAPACITY;
pub use homework::NewHomework;
pub use people::{AccountIds, NewAccount, UserChanges};
pub use rows::*;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'teacher', 'student')),
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teachers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        subject_id INTEGER REFERENCES subjects(id) ON DELETE SET NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS classes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        teacher_id INTEGER NOT NULL REFERENCES teachers(id) ON DELETE CASCADE,
        class_number INTEGER NOT NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student_subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        status TEXT NOT NULL CHECK (status IN ('Present', 'Absent', 'Late')),
        recorded_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS grades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        exam_type TEXT NOT NULL,
        score REAL NOT NULL,
        recorded_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS participation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        week_number INTEGER NOT NULL,
        participation_score REAL NOT NULL,
        recorded_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS homework (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        teacher_id INTEGER NOT NULL REFERENCES teachers(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        file_path TEXT,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        message TEXT NOT NULL,
        sent_at DATETIME NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT 0
    )
    "#,
];

/// Handle to the connection pool. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. The pool keeps exactly one connection
    /// alive for its whole life, since each SQLite memory connection is its
    /// own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account<'a>(name: &'a str, email: &'a str, role: Role) -> NewAccount<'a> {
        NewAccount {
            name,
            email,
            password_hash: "sha256$salt$digest",
            role,
        }
    }

    #[tokio::test]
    async fn schema_can_be_applied_twice() {
        let db = Database::in_memory().await.unwrap();
        let again = Database::with_pool(db.pool().clone()).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn register_creates_the_role_row() {
        let db = Database::in_memory().await.unwrap();

        let student = db
            .create_account(account("Ann", "ann@school.test", Role::Student))
            .await
            .unwrap();
        assert!(student.student_id.is_some());
        assert!(student.teacher_id.is_none());

        let admin = db
            .create_account(account("Root", "root@school.test", Role::Admin))
            .await
            .unwrap();
        assert_eq!((admin.student_id, admin.teacher_id), (None, None));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_schema() {
        let db = Database::in_memory().await.unwrap();
        db.create_account(account("A", "same@school.test", Role::Student))
            .await
            .unwrap();
        let err = db
            .create_account(account("B", "same@school.test", Role::Student))
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn deleting_a_student_user_removes_their_records() {
        let db = Database::in_memory().await.unwrap();
        let subject = db.create_subject("Math").await.unwrap();
        db.create_teacher(account("T", "t@school.test", Role::Teacher), subject)
            .await
            .unwrap();
        let student_id = db
            .create_student(account("S", "s@school.test", Role::Student), &[subject])
            .await
            .unwrap();
        db.insert_grade(student_id, subject, "Quiz 1", 60.0).await.unwrap();
        db.record_attendance(subject, &[(student_id, AttendanceStatus::Late)])
            .await
            .unwrap();

        let user_id = db.find_student(student_id).await.unwrap().unwrap().user_id;
        db.delete_user(user_id).await.unwrap();

        assert!(db.find_student(student_id).await.unwrap().is_none());
        assert!(db.grades_for_student(student_id).await.unwrap().is_empty());
        assert!(db.attendance_for_student(student_id).await.unwrap().is_empty());
        assert!(db.subjects_for_student(student_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn enrolling_without_a_teacher_fails_and_rolls_back() {
        let db = Database::in_memory().await.unwrap();
        let subject = db.create_subject("Latin").await.unwrap();

        let result = db
            .create_student(account("S", "s@school.test", Role::Student), &[subject])
            .await;
        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
        assert!(db.find_user_by_email("s@school.test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn students_fill_the_lowest_numbered_open_class() {
        let db = Database::in_memory().await.unwrap();
        let subject = db.create_subject("Math").await.unwrap();
        let teacher = db
            .create_teacher(account("T", "t@school.test", Role::Teacher), subject)
            .await
            .unwrap();
        let (second, number) = db.open_class(teacher, subject).await.unwrap();
        assert_eq!(number, 2);

        let student = db
            .create_student(account("S", "s@school.test", Role::Student), &[subject])
            .await
            .unwrap();

        let classes = db.classes_for_teacher(teacher).await.unwrap();
        let first = classes[0].id;
        assert_eq!(db.students_in_class(first).await.unwrap()[0].student_id, student);
        assert!(db.students_in_class(second).await.unwrap().is_empty());
    }
}
