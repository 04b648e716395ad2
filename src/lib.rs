//! Plain-text Student Records Management
//!
//! Students, subjects, enrollments, grades and attendance are kept in four
//! flat text files in a data directory.

pub mod domain;
pub use domain::{
    Attendance, Config, Grade, Record, RecordKey, Student, StudentId, Subject, SubjectCode,
};

/// Filesystem storage and in-memory collections for student records.
pub mod storage;
pub use storage::{DataFile, Directory, LoadReport};

pub mod registrar;
pub use registrar::{ErrorKind, OperationError, Registrar, SaveReport, StudentReport};
