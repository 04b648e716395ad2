//! Domain models for student records.
//!
//! This module contains the entity types (students, subjects and
//! grade/attendance records), their identifiers, and configuration.

mod config;
pub use config::{CONFIG_FILE, Config};

/// Strongly-typed identifiers and the composite record key.
pub mod ids;
pub use ids::{InvalidIdError, InvalidTextError, RecordKey, StudentId, SubjectCode};

mod record;
pub use record::{Attendance, AttendanceExceedsTotal, Grade, GradeOutOfRange, Record};

mod student;
pub use student::Student;

mod subject;
pub use subject::Subject;
