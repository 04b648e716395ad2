/// Line-oriented text codecs for students, subjects, enrollments and records.
pub mod codec;
/// Filesystem-agnostic in-memory collections.
pub mod collections;
pub mod directory;

pub use codec::{FormatError, LineCodec};
pub use collections::{Collections, EnrollmentEntry, IntegrityIssue};
pub use directory::{
    DataFile, Directory, LineProblem, LoadError, LoadReport, LoadWarning, SaveError,
};
