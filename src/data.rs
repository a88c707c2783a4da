use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::Reader;
use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::model::{ModelError, FEATURE_COUNT};

/// One row of the historical grade export used to fit the model.
#[derive(Debug, Deserialize)]
struct GradeRow {
    #[serde(rename = "AttendancePercent")]
    attendance_percent: f64,
    #[serde(rename = "ParticipationScore")]
    participation_score: f64,
    #[serde(rename = "PastGrade")]
    past_grade: f64,
    #[serde(rename = "FinalGrade")]
    final_grade: f64,
}

/// Feature matrix (one row per student, columns in feature-vector order)
/// and the final grades it should predict.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub records: Array2<f64>,
    pub targets: Array1<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

pub fn load_training_set(path: &Path) -> Result<TrainingSet, ModelError> {
    read_training_set(File::open(path)?)
}

pub fn read_training_set<R: Read>(input: R) -> Result<TrainingSet, ModelError> {
    let mut rdr = Reader::from_reader(input);
    let mut features = Vec::new();
    let mut targets = Vec::new();

    for row in rdr.deserialize() {
        let row: GradeRow = row?;
        features.extend([row.attendance_percent, row.participation_score, row.past_grade]);
        targets.push(row.final_grade);
    }

    if targets.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let rows = targets.len();
    Ok(TrainingSet {
        records: Array2::from_shape_vec((rows, FEATURE_COUNT), features)?,
        targets: Array1::from_vec(targets),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
AttendancePercent,ParticipationScore,PastGrade,FinalGrade
90,80,85,88
60,40,55,58
";

    #[test]
    fn reads_rows_in_feature_order() {
        let set = read_training_set(SAMPLE.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records.row(0).to_vec(), vec![90.0, 80.0, 85.0]);
        assert_eq!(set.targets.to_vec(), vec![88.0, 58.0]);
    }

    #[test]
    fn header_only_file_is_rejected() {
        let err = read_training_set("AttendancePercent,ParticipationScore,PastGrade,FinalGrade\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyDataset));
    }

    #[test]
    fn non_numeric_cell_is_a_csv_error() {
        let bad = "AttendancePercent,ParticipationScore,PastGrade,FinalGrade\nninety,80,85,88\n";
        assert!(matches!(read_training_set(bad.as_bytes()), Err(ModelError::Csv(_))));
    }
}
