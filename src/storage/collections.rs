//! In-memory collections of students, subjects, records and enrollments.
//!
//! [`Collections`] knows nothing about the filesystem. Every collection keeps
//! its insertion (or load) order, with a hash index for lookups by key.

use std::{collections::HashMap, fmt, hash::Hash};

use crate::domain::{Record, RecordKey, Student, StudentId, Subject, SubjectCode};

/// An insertion-ordered collection with keyed lookup.
#[derive(Debug, Clone)]
struct Ordered<K, V> {
    items: Vec<V>,
    index: HashMap<K, usize>,
}

// The index is derived from the items, so only the items are compared.
impl<K, V: PartialEq> PartialEq for Ordered<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<K, V> Default for Ordered<K, V> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Ordered<K, V> {
    /// Inserts a value, replacing (in place) any value with the same key.
    ///
    /// Returns the replaced value.
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.items[position], value));
        }
        self.index.insert(key, self.items.len());
        self.items.push(value);
        None
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&position| &self.items[position])
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.index
            .get(key)
            .map(|&position| &mut self.items[position])
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// The subjects one student is enrolled in, as stored in the enrollment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentEntry {
    /// The enrolled student.
    pub student: StudentId,
    /// Subject codes, in enrollment order.
    pub subjects: Vec<SubjectCode>,
}

/// A violation of the enrollment invariant found in loaded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// A record refers to a student that does not exist.
    UnknownStudent(RecordKey),
    /// A record or enrollment refers to a subject that does not exist.
    UnknownSubject(RecordKey),
    /// A record exists, but the pair is missing from the enrollment index.
    MissingEnrollment(RecordKey),
    /// An enrollment exists, but there is no record for the pair.
    MissingRecord(RecordKey),
}

impl IntegrityIssue {
    /// The (student, subject) pair the issue concerns.
    #[must_use]
    pub const fn key(&self) -> &RecordKey {
        match self {
            Self::UnknownStudent(key)
            | Self::UnknownSubject(key)
            | Self::MissingEnrollment(key)
            | Self::MissingRecord(key) => key,
        }
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key();
        let (student, subject) = (key.student(), key.subject());
        match self {
            Self::UnknownStudent(_) => {
                write!(f, "record {student}/{subject} refers to unknown student {student}")
            }
            Self::UnknownSubject(_) => {
                write!(f, "{student}/{subject} refers to unknown subject {subject}")
            }
            Self::MissingEnrollment(_) => {
                write!(f, "record {student}/{subject} has no matching enrollment")
            }
            Self::MissingRecord(_) => {
                write!(f, "enrollment {student}/{subject} has no matching record")
            }
        }
    }
}

/// The four in-memory collections.
///
/// Invariant (maintained by [`Collections::enroll`]): every record key also
/// appears in the enrollment index and in the student's subject list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Collections {
    students: Ordered<StudentId, Student>,
    subjects: Ordered<SubjectCode, Subject>,
    records: Ordered<RecordKey, Record>,
    enrollments: Ordered<StudentId, EnrollmentEntry>,
}

impl Collections {
    /// Inserts a student, replacing any student with the same ID in place.
    pub fn insert_student(&mut self, student: Student) -> Option<Student> {
        self.students.insert(student.id().clone(), student)
    }

    /// Inserts a subject, replacing any subject with the same code in place.
    pub fn insert_subject(&mut self, subject: Subject) -> Option<Subject> {
        self.subjects.insert(subject.code().clone(), subject)
    }

    /// Inserts a record, replacing any record with the same key in place.
    ///
    /// This does not touch the enrollment index; use [`Collections::enroll`]
    /// to create a new enrollment.
    pub fn insert_record(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.key().clone(), record)
    }

    /// Applies a persisted enrollment entry, replacing the student's subject
    /// list wholesale.
    ///
    /// Returns `false` (and changes nothing) if the student is unknown.
    pub fn apply_enrollment(&mut self, mut entry: EnrollmentEntry) -> bool {
        let Some(student) = self.students.get_mut(&entry.student) else {
            return false;
        };
        student.set_enrolled_subjects(entry.subjects);
        entry.subjects = student.enrolled_subjects().to_vec();
        self.enrollments.insert(entry.student.clone(), entry);
        true
    }

    /// Enrolls a student in a subject: creates an empty record and appends the
    /// subject to both the student's list and the enrollment index.
    ///
    /// Returns `false` (and changes nothing) if a record already exists for
    /// the pair.
    pub(crate) fn enroll(&mut self, key: RecordKey) -> bool {
        if self.records.contains(&key) {
            return false;
        }
        self.link_enrollment(&key);
        self.records.insert(key.clone(), Record::new(key));
        true
    }

    fn link_enrollment(&mut self, key: &RecordKey) {
        if let Some(student) = self.students.get_mut(key.student()) {
            student.enroll(key.subject().clone());
        }
        if let Some(entry) = self.enrollments.get_mut(key.student()) {
            if !entry.subjects.contains(key.subject()) {
                entry.subjects.push(key.subject().clone());
            }
        } else {
            self.enrollments.insert(
                key.student().clone(),
                EnrollmentEntry {
                    student: key.student().clone(),
                    subjects: vec![key.subject().clone()],
                },
            );
        }
    }

    /// Looks up a student by ID.
    #[must_use]
    pub fn student(&self, id: &StudentId) -> Option<&Student> {
        self.students.get(id)
    }

    /// Looks up a subject by code.
    #[must_use]
    pub fn subject(&self, code: &SubjectCode) -> Option<&Subject> {
        self.subjects.get(code)
    }

    /// Looks up the record for an enrollment.
    #[must_use]
    pub fn record(&self, key: &RecordKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub(crate) fn record_mut(&mut self, key: &RecordKey) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    /// Whether a student with this ID exists.
    #[must_use]
    pub fn contains_student(&self, id: &StudentId) -> bool {
        self.students.contains(id)
    }

    /// Whether a subject with this code exists.
    #[must_use]
    pub fn contains_subject(&self, code: &SubjectCode) -> bool {
        self.subjects.contains(code)
    }

    /// All students, in insertion order.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students.items
    }

    /// All subjects, in insertion order.
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects.items
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records.items
    }

    /// The enrollment index, in insertion order.
    #[must_use]
    pub fn enrollments(&self) -> &[EnrollmentEntry] {
        &self.enrollments.items
    }

    /// The subjects a student is enrolled in, according to the enrollment
    /// index.
    #[must_use]
    pub fn enrolled_subjects(&self, id: &StudentId) -> &[SubjectCode] {
        self.enrollments
            .get(id)
            .map(|entry| entry.subjects.as_slice())
            .unwrap_or_default()
    }

    /// The total number of entities across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.students.len() + self.subjects.len() + self.records.len()
    }

    /// Whether all collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.enrollments.len() == 0
    }

    /// Checks the enrollment invariant across all collections.
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for record in self.records() {
            let key = record.key();
            if !self.contains_student(key.student()) {
                issues.push(IntegrityIssue::UnknownStudent(key.clone()));
            }
            if !self.contains_subject(key.subject()) {
                issues.push(IntegrityIssue::UnknownSubject(key.clone()));
            }
            if !self.enrolled_subjects(key.student()).contains(key.subject()) {
                issues.push(IntegrityIssue::MissingEnrollment(key.clone()));
            }
        }

        for entry in self.enrollments() {
            for subject in &entry.subjects {
                let key = RecordKey::new(entry.student.clone(), subject.clone());
                if self.records.contains(&key) {
                    continue;
                }
                if self.contains_subject(subject) {
                    issues.push(IntegrityIssue::MissingRecord(key));
                } else {
                    issues.push(IntegrityIssue::UnknownSubject(key));
                }
            }
        }

        issues
    }

    /// Repairs the issues that can be repaired without inventing entities.
    ///
    /// Records whose student exists are added to the enrollment index, and
    /// enrollments whose subject exists get an empty record. Returns the
    /// number of repairs made, split into (enrollments, records).
    pub(crate) fn reconcile(&mut self) -> (usize, usize) {
        let mut enrollments = 0;
        let mut records = 0;

        for issue in self.integrity_issues() {
            match issue {
                IntegrityIssue::MissingEnrollment(key) if self.contains_student(key.student()) => {
                    self.link_enrollment(&key);
                    enrollments += 1;
                }
                IntegrityIssue::MissingRecord(key) => {
                    tracing::debug!("Creating empty record for {key}");
                    self.records.insert(key.clone(), Record::new(key));
                    records += 1;
                }
                _ => {}
            }
        }

        (enrollments, records)
    }
}
