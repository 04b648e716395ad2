//! The operations used by the command line: adding students and subjects,
//! enrolling, grading, attendance, and reports.
//!
//! Every mutating operation validates the request against the in-memory
//! collections, applies it, and immediately rewrites only the data files it
//! touched. Business-rule violations are returned as an [`OperationError`];
//! persistence failures are logged and returned in a [`SaveReport`], leaving
//! the in-memory state as mutated.

use std::{num::NonZeroU32, path::Path};

use tracing::instrument;

use crate::{
    domain::{
        Config, Grade, GradeOutOfRange, InvalidTextError, Record, RecordKey, Student, StudentId,
        Subject, SubjectCode,
    },
    storage::{DataFile, Directory, IntegrityIssue, LoadError, LoadReport, SaveError},
};

/// The broad category of an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An entity with the same key already exists.
    DuplicateKey,
    /// A referenced student, subject or enrollment does not exist.
    NotFound,
    /// The student is already enrolled in the subject.
    AlreadyEnrolled,
    /// A grade was outside `0..=100`.
    OutOfRange,
    /// A name or section could not be stored in the line format.
    InvalidInput,
}

/// A request that violates a business rule. Nothing is changed.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum OperationError {
    /// A student with this ID already exists.
    #[error("student with ID {0} already exists")]
    DuplicateStudent(StudentId),
    /// A subject with this code already exists.
    #[error("subject with code {0} already exists")]
    DuplicateSubject(SubjectCode),
    /// No student has this ID.
    #[error("student with ID {0} not found")]
    StudentNotFound(StudentId),
    /// No subject has this code.
    #[error("subject with code {0} not found")]
    SubjectNotFound(SubjectCode),
    /// A record already exists for this (student, subject) pair.
    #[error("student {} is already enrolled in {}", .0.student(), .0.subject())]
    AlreadyEnrolled(RecordKey),
    /// No record exists for this (student, subject) pair.
    #[error("enrollment record for student {} in {} not found", .0.student(), .0.subject())]
    RecordNotFound(RecordKey),
    /// The grade was outside `0..=100`.
    #[error(transparent)]
    GradeOutOfRange(#[from] GradeOutOfRange),
    /// A name or section contained `|` or a line break.
    #[error(transparent)]
    InvalidText(#[from] InvalidTextError),
}

impl OperationError {
    /// The broad category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateStudent(_) | Self::DuplicateSubject(_) => ErrorKind::DuplicateKey,
            Self::StudentNotFound(_) | Self::SubjectNotFound(_) | Self::RecordNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyEnrolled(_) => ErrorKind::AlreadyEnrolled,
            Self::GradeOutOfRange(_) => ErrorKind::OutOfRange,
            Self::InvalidText(_) => ErrorKind::InvalidInput,
        }
    }
}

/// The outcome of persisting a successful operation.
#[derive(Debug, Default)]
pub struct SaveReport {
    failures: Vec<SaveError>,
}

impl SaveReport {
    /// Whether every touched file was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The files that could not be written.
    #[must_use]
    pub fn failures(&self) -> &[SaveError] {
        &self.failures
    }

    fn record(&mut self, result: Result<(), SaveError>) {
        if let Err(error) = result {
            tracing::error!("{error}: {}", error.source);
            self.failures.push(error);
        }
    }
}

/// The grade and attendance summary of one enrolled subject.
#[derive(Debug, Clone, Copy)]
pub struct SubjectSummary<'a> {
    /// The subject.
    pub subject: &'a Subject,
    /// The student's record in the subject.
    pub record: &'a Record,
    /// Mean grade, or `0.0` if there are no grades.
    pub average_grade: f64,
    /// Attendance percentage, or `0.0` if no classes have been held.
    pub attendance_percentage: f64,
}

/// A report on one student and each subject they are enrolled in.
#[derive(Debug, Clone)]
pub struct StudentReport<'a> {
    /// The student.
    pub student: &'a Student,
    /// One summary per enrolled subject, in enrollment order.
    pub subjects: Vec<SubjectSummary<'a>>,
}

/// The repairs made by [`Registrar::reconcile`].
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Records added to the enrollment index.
    pub enrollments_added: usize,
    /// Empty records created for existing enrollments.
    pub records_added: usize,
    /// The outcome of persisting the repairs.
    pub save: SaveReport,
}

/// Enforces the integrity rules over a [`Directory`] and exposes the
/// operations of the records manager.
#[derive(Debug)]
pub struct Registrar {
    directory: Directory,
}

impl Registrar {
    /// Wraps an already-loaded directory.
    #[must_use]
    pub const fn new(directory: Directory) -> Self {
        Self { directory }
    }

    /// Opens the repository at `root`, reading `registrar.toml` if present
    /// and loading all data files.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or a data file
    /// cannot be loaded.
    pub fn open(root: &Path) -> Result<(Self, LoadReport), LoadError> {
        let config = Config::load_or_default(root);
        let (directory, report) = Directory::open(root, config)?;
        Ok((Self::new(directory), report))
    }

    /// The underlying store.
    #[must_use]
    pub const fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Adds a new student.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::DuplicateKey`] if the ID is taken.
    #[instrument(level = "debug", skip(self))]
    pub fn add_student(
        &mut self,
        id: StudentId,
        name: &str,
        section: &str,
    ) -> Result<SaveReport, OperationError> {
        let collections = self.directory.collections();
        if collections.contains_student(&id) {
            return Err(OperationError::DuplicateStudent(id));
        }
        let student = Student::new(id, name, section)?;

        tracing::info!("Added student {}", student.id());
        self.directory.collections_mut().insert_student(student);
        Ok(self.persist(&[DataFile::Students]))
    }

    /// Adds a new subject.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::DuplicateKey`] if the code is taken.
    #[instrument(level = "debug", skip(self))]
    pub fn add_subject(
        &mut self,
        code: SubjectCode,
        name: &str,
        credit_hours: NonZeroU32,
    ) -> Result<SaveReport, OperationError> {
        if self.directory.collections().contains_subject(&code) {
            return Err(OperationError::DuplicateSubject(code));
        }
        let subject = Subject::new(code, name, credit_hours)?;

        tracing::info!("Added subject {}", subject.code());
        self.directory.collections_mut().insert_subject(subject);
        Ok(self.persist(&[DataFile::Subjects]))
    }

    /// Enrolls a student in a subject, creating an empty record.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`] if the student or subject is
    /// unknown, and with [`ErrorKind::AlreadyEnrolled`] if a record for the
    /// pair already exists.
    #[instrument(level = "debug", skip(self))]
    pub fn enroll_student(
        &mut self,
        student: &StudentId,
        subject: &SubjectCode,
    ) -> Result<SaveReport, OperationError> {
        let collections = self.directory.collections();
        if !collections.contains_student(student) {
            return Err(OperationError::StudentNotFound(student.clone()));
        }
        if !collections.contains_subject(subject) {
            return Err(OperationError::SubjectNotFound(subject.clone()));
        }

        let key = RecordKey::new(student.clone(), subject.clone());
        if !self.directory.collections_mut().enroll(key.clone()) {
            return Err(OperationError::AlreadyEnrolled(key));
        }

        tracing::info!("Enrolled {student} in {subject}");
        Ok(self.persist(&[DataFile::Enrollments, DataFile::Records]))
    }

    /// Appends a grade to an enrollment record.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`] if there is no record for the pair,
    /// and with [`ErrorKind::OutOfRange`] if the grade is outside `0..=100`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_grade(
        &mut self,
        student: &StudentId,
        subject: &SubjectCode,
        value: f64,
    ) -> Result<SaveReport, OperationError> {
        let key = RecordKey::new(student.clone(), subject.clone());
        let record = self.record_mut(key)?;
        let grade = Grade::new(value)?;
        record.add_grade(grade);

        tracing::info!("Added grade {grade} for {student} in {subject}");
        Ok(self.persist(&[DataFile::Records]))
    }

    /// Records one class for an enrollment, attended or not.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`] if there is no record for the pair.
    #[instrument(level = "debug", skip(self))]
    pub fn mark_attendance(
        &mut self,
        student: &StudentId,
        subject: &SubjectCode,
        present: bool,
    ) -> Result<SaveReport, OperationError> {
        let key = RecordKey::new(student.clone(), subject.clone());
        self.record_mut(key)?.mark_attendance(present);

        tracing::info!(
            "Marked {student} {} in {subject}",
            if present { "present" } else { "absent" }
        );
        Ok(self.persist(&[DataFile::Records]))
    }

    /// Builds a report of a student's enrolled subjects with their average
    /// grade and attendance percentage.
    ///
    /// Subjects whose subject entry or record is missing are left out.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NotFound`] if the student is unknown.
    pub fn student_report(&self, id: &StudentId) -> Result<StudentReport<'_>, OperationError> {
        let collections = self.directory.collections();
        let student = collections
            .student(id)
            .ok_or_else(|| OperationError::StudentNotFound(id.clone()))?;

        let subjects = student
            .enrolled_subjects()
            .iter()
            .filter_map(|code| {
                let subject = collections.subject(code)?;
                let record = collections.record(&RecordKey::new(id.clone(), code.clone()))?;
                Some(SubjectSummary {
                    subject,
                    record,
                    average_grade: record.average_grade(),
                    attendance_percentage: record.attendance_percentage(),
                })
            })
            .collect();

        Ok(StudentReport { student, subjects })
    }

    /// All students, in insertion (or load) order.
    #[must_use]
    pub fn list_all_students(&self) -> &[Student] {
        self.directory.collections().students()
    }

    /// Violations of the enrollment invariant in the loaded data.
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        self.directory.collections().integrity_issues()
    }

    /// Repairs what can be repaired of the integrity issues and persists the
    /// enrollment and record files if anything changed.
    pub fn reconcile(&mut self) -> Reconciliation {
        let (enrollments_added, records_added) = self.directory.collections_mut().reconcile();
        let save = if enrollments_added + records_added > 0 {
            tracing::info!(
                "Reconciled {enrollments_added} enrollment(s) and {records_added} record(s)"
            );
            self.persist(&[DataFile::Enrollments, DataFile::Records])
        } else {
            SaveReport::default()
        };
        Reconciliation {
            enrollments_added,
            records_added,
            save,
        }
    }

    /// Rewrites all four data files.
    pub fn save_all(&self) -> SaveReport {
        self.persist(&DataFile::ALL)
    }

    fn record_mut(&mut self, key: RecordKey) -> Result<&mut Record, OperationError> {
        self.directory
            .collections_mut()
            .record_mut(&key)
            .ok_or(OperationError::RecordNotFound(key))
    }

    fn persist(&self, files: &[DataFile]) -> SaveReport {
        let mut report = SaveReport::default();
        for &file in files {
            report.record(self.directory.save(file));
        }
        report
    }
}
