use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::TrainingSet;
use crate::features::FeatureVector;

pub const FEATURE_COUNT: usize = 3;
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["AttendancePercent", "ParticipationScore", "PastGrade"];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("artifact i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("training data could not be read: {0}")]
    Csv(#[from] csv::Error),

    #[error("training data has the wrong shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("training data has no rows")]
    EmptyDataset,

    #[error("artifact declares {found} coefficients, expected 3")]
    FeatureCount { found: usize },

    #[error("fitting failed: {0}")]
    Fit(String),

    #[error("evaluation failed: {0}")]
    Metrics(#[from] linfa::Error),
}

/// Final-grade regressor over the three-feature vector.
///
/// Implementations are immutable after construction and shared across
/// request workers, so `predict` takes `&self` and must be deterministic.
pub trait GradeModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Held-out evaluation recorded at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub train_rows: usize,
    pub test_rows: usize,
    pub mse: Option<f64>,
    pub r2: Option<f64>,
}

/// On-disk form of a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeModelArtifact {
    pub features: Vec<String>,
    pub params: Vec<f64>,
    pub intercept: f64,
    pub metrics: EvaluationMetrics,
    pub trained_at: DateTime<Utc>,
}

impl GradeModelArtifact {
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

/// Ordinary least squares model: `intercept + params · features`.
///
/// Inputs are not range-checked and the output is not clamped; callers that
/// need a value inside `[0, 100]` clamp it themselves.
#[derive(Debug, Clone)]
pub struct LinearGradeModel {
    params: Array1<f64>,
    intercept: f64,
    metrics: EvaluationMetrics,
}

impl LinearGradeModel {
    pub fn from_artifact(artifact: GradeModelArtifact) -> Result<Self, ModelError> {
        if artifact.params.len() != FEATURE_COUNT {
            return Err(ModelError::FeatureCount {
                found: artifact.params.len(),
            });
        }
        Ok(Self {
            params: Array1::from_vec(artifact.params),
            intercept: artifact.intercept,
            metrics: artifact.metrics,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Self::from_artifact(GradeModelArtifact::load(path)?)
    }

    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn metrics(&self) -> &EvaluationMetrics {
        &self.metrics
    }
}

impl GradeModel for LinearGradeModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.params.dot(&features.to_array()) + self.intercept)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    /// Share of rows held out for evaluation.
    pub test_ratio: f32,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// Shuffles, splits and fits the training set, then scores the fit on the
/// held-out rows.
pub fn train_model(set: TrainingSet, options: TrainOptions) -> Result<GradeModelArtifact, ModelError> {
    if set.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let dataset = Dataset::new(set.records, set.targets).shuffle(&mut rng);
    let train_ratio = (1.0 - options.test_ratio).clamp(0.0, 1.0);
    let (train, valid) = dataset.split_with_ratio(train_ratio);
    if train.nsamples() == 0 {
        return Err(ModelError::EmptyDataset);
    }

    let fitted = LinearRegression::new()
        .fit(&train)
        .map_err(|e| ModelError::Fit(e.to_string()))?;

    let (mse, r2) = if valid.nsamples() > 0 {
        let predictions = fitted.predict(&valid);
        (
            Some(predictions.mean_squared_error(&valid)?),
            Some(predictions.r2(&valid)?),
        )
    } else {
        (None, None)
    };

    let metrics = EvaluationMetrics {
        train_rows: train.nsamples(),
        test_rows: valid.nsamples(),
        mse,
        r2,
    };
    log::info!(
        "fitted grade model on {} rows (held out {}): mse={:?} r2={:?}",
        metrics.train_rows,
        metrics.test_rows,
        metrics.mse,
        metrics.r2
    );

    Ok(GradeModelArtifact {
        features: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        params: fitted.params().to_vec(),
        intercept: fitted.intercept(),
        metrics,
        trained_at: Utc::now(),
    })
}
