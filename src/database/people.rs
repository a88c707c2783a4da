use chrono::Utc;
use sqlx::SqliteConnection;

use super::classes::{enroll_in_subjects, insert_class};
use super::{Database, Role, Student, StudentProfile, Teacher, TeacherProfile, User};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

/// Credentials and role for a new login.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

/// Partial update of a user row; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Ids created by [`Database::create_account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountIds {
    pub user_id: i64,
    pub student_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

async fn insert_user(conn: &mut SqliteConnection, account: &NewAccount<'_>) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (name, email, password, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(account.name)
    .bind(account.email)
    .bind(account.password_hash)
    .bind(account.role)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_student(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO students (user_id, created_at) VALUES (?, ?)")
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_teacher(
    conn: &mut SqliteConnection,
    user_id: i64,
    subject_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO teachers (user_id, subject_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(subject_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

impl Database {
    /// Creates a user and, for students and teachers, the matching role row.
    pub async fn create_account(&self, account: NewAccount<'_>) -> Result<AccountIds, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let user_id = insert_user(&mut tx, &account).await?;
        let mut ids = AccountIds {
            user_id,
            student_id: None,
            teacher_id: None,
        };
        match account.role {
            Role::Student => ids.student_id = Some(insert_student(&mut tx, user_id).await?),
            Role::Teacher => ids.teacher_id = Some(insert_teacher(&mut tx, user_id, None).await?),
            Role::Admin => {}
        }
        tx.commit().await?;
        Ok(ids)
    }

    /// Creates a teacher assigned to `subject_id` together with their first
    /// class (number 1) in that subject. Returns the teacher id.
    pub async fn create_teacher(&self, account: NewAccount<'_>, subject_id: i64) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let user_id = insert_user(&mut tx, &account).await?;
        let teacher_id = insert_teacher(&mut tx, user_id, Some(subject_id)).await?;
        insert_class(&mut tx, subject_id, teacher_id, 1).await?;
        tx.commit().await?;
        Ok(teacher_id)
    }

    /// Creates a student and enrolls them in each subject. Returns the
    /// student id.
    pub async fn create_student(&self, account: NewAccount<'_>, subjects: &[i64]) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let user_id = insert_user(&mut tx, &account).await?;
        let student_id = insert_student(&mut tx, user_id).await?;
        enroll_in_subjects(&mut tx, student_id, subjects).await?;
        tx.commit().await?;
        Ok(student_id)
    }

    pub async fn find_user(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn update_user(&self, user_id: i64, changes: &UserChanges) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                password = COALESCE(?, password)
             WHERE id = ?",
        )
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes the user; the student or teacher row and everything that
    /// references it go with it through `ON DELETE CASCADE`.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_student(&self, student_id: i64) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT id, user_id, created_at FROM students WHERE id = ?")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn student_for_user(&self, user_id: i64) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT id, user_id, created_at FROM students WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn student_name(&self, student_id: i64) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT u.name FROM students s JOIN users u ON u.id = s.user_id WHERE s.id = ?")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_teacher(&self, teacher_id: i64) -> Result<Option<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>("SELECT id, user_id, subject_id, created_at FROM teachers WHERE id = ?")
            .bind(teacher_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn teacher_for_user(&self, user_id: i64) -> Result<Option<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>(
            "SELECT id, user_id, subject_id, created_at FROM teachers WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn set_teacher_subject(&self, teacher_id: i64, subject_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE teachers SET subject_id = ? WHERE id = ?")
            .bind(subject_id)
            .bind(teacher_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Any teacher assigned to the subject, lowest id first.
    pub async fn first_teacher_for_subject(&self, subject_id: i64) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM teachers WHERE subject_id = ? ORDER BY id LIMIT 1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_students(&self) -> Result<Vec<StudentProfile>, sqlx::Error> {
        sqlx::query_as::<_, StudentProfile>(
            "SELECT s.id, u.name, u.email, u.role
             FROM students s JOIN users u ON u.id = s.user_id
             ORDER BY s.id",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_teachers(&self) -> Result<Vec<TeacherProfile>, sqlx::Error> {
        sqlx::query_as::<_, TeacherProfile>(
            "SELECT t.id, u.name, u.email, u.role, t.subject_id
             FROM teachers t JOIN users u ON u.id = t.user_id
             ORDER BY t.id",
        )
        .fetch_all(&self.pool)
        .await
    }
}
