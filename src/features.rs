//! Per-student features consumed by the grade model.
//!
//! The three features are pure functions over the student's stored rows, so
//! they can be checked without a database. Every "no data" case yields `0.0`.
//!
//! Two grade averages exist on purpose. [`past_grade_average`] only looks at
//! the fixed set of early assessments in [`PAST_GRADE_EXAMS`] and feeds the
//! model; [`overall_grade_average`] covers every exam type and is what the
//! grades overview shows. Callers pick one by name.

use std::collections::BTreeMap;

use ndarray::{array, Array1};
use serde::Serialize;

use crate::database::{AttendanceRecord, AttendanceStatus, Database, GradeRecord, ParticipationRecord};

/// Credit a late arrival earns relative to a present mark.
pub const LATE_WEIGHT: f64 = 0.7;

/// Participation is scored 0–10; features are percentages.
pub const PARTICIPATION_SCALE: f64 = 10.0;

/// Exam types that count toward the past-grade feature.
pub const PAST_GRADE_EXAMS: [&str; 4] = ["Assignment 1", "Quiz 1", "Quiz 2", "Exam 1"];

/// Model input, in the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub attendance_percent: f64,
    pub participation_percent: f64,
    pub past_grade: f64,
}

impl FeatureVector {
    /// True when all three features are exactly zero, i.e. nothing has been
    /// recorded for the student yet.
    pub fn is_empty(&self) -> bool {
        self.attendance_percent == 0.0 && self.participation_percent == 0.0 && self.past_grade == 0.0
    }

    pub fn to_array(&self) -> Array1<f64> {
        array![self.attendance_percent, self.participation_percent, self.past_grade]
    }
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// `(present + 0.7 * late) / total * 100` over every mark, any subject.
pub fn attendance_rate(records: &[AttendanceRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count() as f64;
    let late = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count() as f64;
    (present + LATE_WEIGHT * late) / records.len() as f64 * 100.0
}

/// Mean of weekly means, each score rescaled to 0–100.
///
/// Records sharing a week are averaged together, duplicates included, and
/// every week weighs the same regardless of how many records it holds.
pub fn average_participation(records: &[ParticipationRecord]) -> f64 {
    let mut weeks: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for record in records {
        weeks
            .entry(record.week_number)
            .or_default()
            .push(record.participation_score * PARTICIPATION_SCALE);
    }
    mean(weeks.values().filter_map(|scores| mean(scores.iter().copied()))).unwrap_or(0.0)
}

/// Mean score over the [`PAST_GRADE_EXAMS`] assessments only.
pub fn past_grade_average(grades: &[GradeRecord]) -> f64 {
    mean(
        grades
            .iter()
            .filter(|g| PAST_GRADE_EXAMS.contains(&g.exam_type.as_str()))
            .map(|g| g.score),
    )
    .unwrap_or(0.0)
}

/// Mean score over every grade, any exam type.
pub fn overall_grade_average(grades: &[GradeRecord]) -> f64 {
    mean(grades.iter().map(|g| g.score)).unwrap_or(0.0)
}

/// Loads the student's rows and computes the model features.
pub async fn student_features(db: &Database, student_id: i64) -> Result<FeatureVector, sqlx::Error> {
    let attendance = db.attendance_for_student(student_id).await?;
    let participation = db.participation_for_student(student_id).await?;
    let grades = db.grades_for_student(student_id).await?;

    let features = FeatureVector {
        attendance_percent: attendance_rate(&attendance),
        participation_percent: average_participation(&participation),
        past_grade: past_grade_average(&grades),
    };
    log::debug!(
        "student {student_id} features from {} attendance, {} participation, {} grade rows: {features:?}",
        attendance.len(),
        participation.len(),
        grades.len()
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mark(status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            student_id: 1,
            subject_id: 1,
            status,
            recorded_at: Utc::now(),
        }
    }

    fn participation(week_number: i64, score: f64) -> ParticipationRecord {
        ParticipationRecord {
            id: 0,
            student_id: 1,
            subject_id: 1,
            week_number,
            participation_score: score,
            recorded_at: Utc::now(),
        }
    }

    fn grade(exam_type: &str, score: f64) -> GradeRecord {
        GradeRecord {
            id: 0,
            student_id: 1,
            subject_id: 1,
            exam_type: exam_type.to_string(),
            score,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn attendance_without_records_is_zero() {
        assert_eq!(attendance_rate(&[]), 0.0);
    }

    #[test]
    fn late_counts_for_seventy_percent() {
        let mut records = vec![mark(AttendanceStatus::Present); 7];
        records.extend(vec![mark(AttendanceStatus::Late); 2]);
        records.push(mark(AttendanceStatus::Absent));

        assert!((attendance_rate(&records) - 84.0).abs() < 1e-9);
    }

    #[test]
    fn all_absent_is_zero_percent() {
        let records = vec![mark(AttendanceStatus::Absent); 4];
        assert_eq!(attendance_rate(&records), 0.0);
    }

    #[test]
    fn participation_averages_weeks_not_records() {
        let records = vec![participation(1, 5.0), participation(1, 7.0), participation(2, 9.0)];
        assert!((average_participation(&records) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_weeks_dilute_that_week_only() {
        // Week 3 holds a duplicate pair (10, 0) and averages to 50.
        let records = vec![participation(3, 10.0), participation(3, 0.0), participation(4, 10.0)];
        assert!((average_participation(&records) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn participation_without_records_is_zero() {
        assert_eq!(average_participation(&[]), 0.0);
    }

    #[test]
    fn past_grade_ignores_exams_outside_the_allowlist() {
        let grades = vec![grade("Assignment 1", 80.0), grade("Exam 2", 100.0)];
        assert!((past_grade_average(&grades) - 80.0).abs() < 1e-9);
        assert!((overall_grade_average(&grades) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn past_grade_matches_exam_labels_exactly() {
        let grades = vec![grade("quiz 1", 40.0), grade("Quiz 1 ", 60.0)];
        assert_eq!(past_grade_average(&grades), 0.0);
        assert!((overall_grade_average(&grades) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn past_grade_averages_all_four_assessments() {
        let grades = vec![
            grade("Assignment 1", 70.0),
            grade("Quiz 1", 80.0),
            grade("Quiz 2", 90.0),
            grade("Exam 1", 60.0),
        ];
        assert!((past_grade_average(&grades) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn grade_averages_without_records_are_zero() {
        assert_eq!(past_grade_average(&[]), 0.0);
        assert_eq!(overall_grade_average(&[]), 0.0);
    }

    #[test]
    fn empty_vector_detection_requires_exact_zeros() {
        let zero = FeatureVector {
            attendance_percent: 0.0,
            participation_percent: 0.0,
            past_grade: 0.0,
        };
        assert!(zero.is_empty());
        assert!(!FeatureVector { past_grade: 0.5, ..zero }.is_empty());
    }
}
