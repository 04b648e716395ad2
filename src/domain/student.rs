use crate::domain::{InvalidTextError, StudentId, SubjectCode, ids::checked_text};

/// A student and the subjects they are enrolled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id: StudentId,
    name: String,
    section: String,
    /// Enrolled subject codes, in enrollment order. Never contains duplicates.
    enrolled_subjects: Vec<SubjectCode>,
}

impl Student {
    /// Creates a student with no enrollments.
    ///
    /// The name and section are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTextError`] if the name or section contains `|` or a
    /// line break.
    pub fn new(id: StudentId, name: &str, section: &str) -> Result<Self, InvalidTextError> {
        Ok(Self {
            id,
            name: checked_text("name", name)?,
            section: checked_text("section", section)?,
            enrolled_subjects: Vec::new(),
        })
    }

    /// The student's unique identifier.
    #[must_use]
    pub const fn id(&self) -> &StudentId {
        &self.id
    }

    /// The student's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The section (or batch) the student belongs to.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// The subjects this student is enrolled in, in enrollment order.
    #[must_use]
    pub fn enrolled_subjects(&self) -> &[SubjectCode] {
        &self.enrolled_subjects
    }

    /// The number of subjects this student is enrolled in.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.enrolled_subjects.len()
    }

    /// Whether the student is enrolled in the given subject.
    #[must_use]
    pub fn is_enrolled_in(&self, code: &SubjectCode) -> bool {
        self.enrolled_subjects.contains(code)
    }

    /// Appends a subject to the enrollment list.
    ///
    /// Returns `false` if the student was already enrolled in it.
    pub(crate) fn enroll(&mut self, code: SubjectCode) -> bool {
        if self.is_enrolled_in(&code) {
            return false;
        }
        self.enrolled_subjects.push(code);
        true
    }

    /// Replaces the enrollment list wholesale, dropping repeated codes.
    pub(crate) fn set_enrolled_subjects(&mut self, codes: impl IntoIterator<Item = SubjectCode>) {
        self.enrolled_subjects.clear();
        for code in codes {
            self.enroll(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn code(s: &str) -> SubjectCode {
        SubjectCode::new(s).unwrap()
    }

    #[test]
    fn enroll_rejects_duplicates() {
        let mut student = Student::new(StudentId::new("S1").unwrap(), "Alice", "A").unwrap();

        assert!(student.enroll(code("C1")));
        assert!(!student.enroll(code("C1")));
        assert_eq!(student.enrolled_subjects(), &[code("C1")]);
    }

    #[test]
    fn set_enrolled_subjects_replaces_and_dedups() {
        let mut student = Student::new(StudentId::new("S1").unwrap(), "Alice", "A").unwrap();
        student.enroll(code("OLD"));

        student.set_enrolled_subjects([code("C2"), code("C1"), code("C2")]);

        assert_eq!(student.enrolled_subjects(), &[code("C2"), code("C1")]);
        assert_eq!(student.subject_count(), 2);
    }

    #[test]
    fn text_fields_are_trimmed() {
        let student = Student::new(StudentId::new("S1").unwrap(), " Alice ", " A\t").unwrap();

        assert_eq!(student.name(), "Alice");
        assert_eq!(student.section(), "A");
    }

    #[test_case("Alice | Bob", "A"; "pipe in name")]
    #[test_case("Alice", "A\nB"; "line break in section")]
    fn delimiters_in_text_are_rejected(name: &str, section: &str) {
        assert!(Student::new(StudentId::new("S1").unwrap(), name, section).is_err());
    }
}
