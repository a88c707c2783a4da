#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;

use school_performance::database::{Database, NewAccount, Role};
use school_performance::features::FeatureVector;
use school_performance::model::{GradeModel, ModelError};
use school_performance::password::hash_password;
use school_performance::routes::AppState;

/// Returns a fixed grade and remembers how it was called.
pub struct StubModel {
    pub answer: Result<f64, String>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<FeatureVector>>,
}

impl StubModel {
    pub fn returning(grade: f64) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(grade),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GradeModel for StubModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(*features);
        self.answer.clone().map_err(ModelError::Fit)
    }
}

pub async fn state_with(model: Arc<StubModel>) -> (web::Data<AppState>, Database) {
    let db = Database::in_memory().await.unwrap();
    let state = web::Data::new(AppState::new(db.clone(), model));
    (state, db)
}

pub async fn state() -> (web::Data<AppState>, Database) {
    state_with(StubModel::returning(70.0)).await
}

/// A teacher for `subject_id` with their default class. Returns
/// `(teacher_id, class_id)`.
pub async fn seed_teacher(db: &Database, email: &str, subject_id: i64) -> (i64, i64) {
    let hash = hash_password("secret");
    let teacher_id = db
        .create_teacher(
            NewAccount {
                name: "Ms Teacher",
                email,
                password_hash: &hash,
                role: Role::Teacher,
            },
            subject_id,
        )
        .await
        .unwrap();
    let class_id = db.classes_for_teacher(teacher_id).await.unwrap()[0].id;
    (teacher_id, class_id)
}

pub async fn seed_student(db: &Database, name: &str, email: &str, subjects: &[i64]) -> i64 {
    let hash = hash_password("secret");
    db.create_student(
        NewAccount {
            name,
            email,
            password_hash: &hash,
            role: Role::Student,
        },
        subjects,
    )
    .await
    .unwrap()
}
