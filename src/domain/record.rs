use std::fmt;

use crate::domain::{RecordKey, StudentId, SubjectCode};

/// A single grade value, guaranteed to lie within [`Grade::MIN`, `Grade::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Grade(f64);

impl Grade {
    /// The lowest valid grade.
    pub const MIN: f64 = 0.0;
    /// The highest valid grade.
    pub const MAX: f64 = 100.0;

    /// Creates a grade.
    ///
    /// # Errors
    ///
    /// Returns [`GradeOutOfRange`] if the value is outside `0..=100` or is
    /// not a number.
    pub fn new(value: f64) -> Result<Self, GradeOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GradeOutOfRange(value))
        }
    }

    /// The numeric value of the grade.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Grade {
    type Error = GradeOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Whole grades keep one decimal place (`85.0`), others print exactly.
impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Error returned when a grade lies outside `0..=100`.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq)]
#[error("grade {0} is invalid, must be between 0 and 100")]
pub struct GradeOutOfRange(pub f64);

/// Cumulative attendance counters.
///
/// Invariant: `present <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attendance {
    present: u32,
    total: u32,
}

impl Attendance {
    /// Creates attendance counters from persisted values.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceExceedsTotal`] if `present > total`.
    pub const fn new(present: u32, total: u32) -> Result<Self, AttendanceExceedsTotal> {
        if present > total {
            return Err(AttendanceExceedsTotal { present, total });
        }
        Ok(Self { present, total })
    }

    /// Classes attended.
    #[must_use]
    pub const fn present(self) -> u32 {
        self.present
    }

    /// Classes held.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.total
    }

    /// Records one class, attended or not.
    pub const fn mark(&mut self, present: bool) {
        self.total = self.total.saturating_add(1);
        if present {
            self.present = self.present.saturating_add(1);
        }
    }

    /// Percentage of classes attended, or `0.0` if no classes have been held.
    #[must_use]
    pub fn percentage(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.present) / f64::from(self.total) * 100.0
    }
}

/// Error returned when attended classes exceed classes held.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("attendance {present}/{total} has more classes attended than held")]
pub struct AttendanceExceedsTotal {
    /// Classes attended.
    pub present: u32,
    /// Classes held.
    pub total: u32,
}

/// The grade and attendance history of one enrollment.
///
/// Both histories are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key: RecordKey,
    grades: Vec<Grade>,
    attendance: Attendance,
}

impl Record {
    /// Creates an empty record for a new enrollment.
    #[must_use]
    pub const fn new(key: RecordKey) -> Self {
        Self {
            key,
            grades: Vec::new(),
            attendance: Attendance {
                present: 0,
                total: 0,
            },
        }
    }

    /// Reassembles a record from persisted parts.
    #[must_use]
    pub const fn from_parts(key: RecordKey, grades: Vec<Grade>, attendance: Attendance) -> Self {
        Self {
            key,
            grades,
            attendance,
        }
    }

    /// The (student, subject) pair this record belongs to.
    #[must_use]
    pub const fn key(&self) -> &RecordKey {
        &self.key
    }

    /// The enrolled student.
    #[must_use]
    pub const fn student_id(&self) -> &StudentId {
        self.key.student()
    }

    /// The subject enrolled in.
    #[must_use]
    pub const fn subject_code(&self) -> &SubjectCode {
        self.key.subject()
    }

    /// All grades, in the order they were added.
    #[must_use]
    pub fn grades(&self) -> &[Grade] {
        &self.grades
    }

    /// The attendance counters.
    #[must_use]
    pub const fn attendance(&self) -> Attendance {
        self.attendance
    }

    /// Appends a grade.
    pub fn add_grade(&mut self, grade: Grade) {
        self.grades.push(grade);
    }

    /// Records one class, attended or not.
    pub const fn mark_attendance(&mut self, present: bool) {
        self.attendance.mark(present);
    }

    /// Mean of all grades, or `0.0` if there are none.
    #[must_use]
    pub fn average_grade(&self) -> f64 {
        if self.grades.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.grades.iter().map(|grade| grade.value()).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.grades.len() as f64;
        sum / count
    }

    /// Percentage of classes attended, or `0.0` if none have been held.
    #[must_use]
    pub fn attendance_percentage(&self) -> f64 {
        self.attendance.percentage()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn record() -> Record {
        Record::new(RecordKey::new(
            StudentId::new("S1").unwrap(),
            SubjectCode::new("C1").unwrap(),
        ))
    }

    #[test_case(0.0; "lower bound")]
    #[test_case(100.0; "upper bound")]
    #[test_case(72.5; "fractional")]
    fn grades_within_range_are_accepted(value: f64) {
        assert_eq!(Grade::new(value).unwrap().value(), value);
    }

    #[test_case(-1.0; "below range")]
    #[test_case(101.0; "above range")]
    #[test_case(f64::NAN; "not a number")]
    fn grades_outside_range_are_rejected(value: f64) {
        assert!(Grade::new(value).is_err());
    }

    #[test_case(85.0, "85.0")]
    #[test_case(87.5, "87.5")]
    #[test_case(0.0, "0.0")]
    fn grade_display(value: f64, expected: &str) {
        assert_eq!(Grade::new(value).unwrap().to_string(), expected);
    }

    #[test]
    fn empty_record_has_zero_derived_values() {
        let record = record();
        assert!(record.average_grade().abs() < f64::EPSILON);
        assert!(record.attendance_percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_grades() {
        let mut record = record();
        record.add_grade(Grade::new(80.0).unwrap());
        record.add_grade(Grade::new(90.0).unwrap());
        assert!((record.average_grade() - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attendance_present_then_absent_is_fifty_percent() {
        let mut record = record();
        record.mark_attendance(true);
        record.mark_attendance(false);

        assert_eq!(record.attendance().total(), 2);
        assert_eq!(record.attendance().present(), 1);
        assert!((record.attendance_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attendance_rejects_present_above_total() {
        assert_eq!(
            Attendance::new(3, 2),
            Err(AttendanceExceedsTotal {
                present: 3,
                total: 2
            })
        );
    }
}
