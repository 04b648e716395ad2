//! Line-oriented text codecs for the persisted entities.
//!
//! Every entity is stored as one line of ` | `-separated fields:
//!
//! ```text
//! students.txt     S1 | Alice | A
//! subjects.txt     C1 | Intro | 3
//! enrollments.txt  S1 | C1,C2
//! records.txt      S1 | C1 | grades=[80.0,90.0] | attendance=1/2
//! ```

use std::num::{NonZeroU32, ParseFloatError, ParseIntError};

use crate::{
    domain::{
        Attendance, AttendanceExceedsTotal, Grade, GradeOutOfRange, InvalidIdError,
        InvalidTextError, Record, RecordKey, Student, StudentId, Subject, SubjectCode,
    },
    storage::collections::EnrollmentEntry,
};

/// The separator written between fields.
pub const FIELD_SEPARATOR: &str = " | ";

/// A type that can be written to, and read back from, a single line of text.
///
/// Implementations guarantee that `decode(&x.encode())` reproduces `x`.
pub trait LineCodec: Sized {
    /// The minimum number of fields a line must contain.
    const FIELDS: usize;

    /// Renders the value as a single line, without a trailing newline.
    fn encode(&self) -> String;

    /// Parses a value from a single line.
    ///
    /// Fields are trimmed; fields beyond [`Self::FIELDS`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the line has too few fields or a field
    /// cannot be parsed.
    fn decode(line: &str) -> Result<Self, FormatError>;
}

/// Errors that can occur when decoding a persisted line.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum FormatError {
    /// The line had fewer fields than the entity requires.
    #[error("expected at least {expected} fields, found {found}")]
    MissingFields {
        /// The number of fields required.
        expected: usize,
        /// The number of fields present.
        found: usize,
    },
    /// An identifier field was invalid.
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),
    /// A name or section field was invalid.
    #[error(transparent)]
    InvalidText(#[from] InvalidTextError),
    /// A numeric field could not be parsed.
    #[error("invalid {field} '{value}'")]
    InvalidNumber {
        /// The name of the field.
        field: &'static str,
        /// The raw text of the field.
        value: String,
    },
    /// Credit hours must be positive.
    #[error("credit hours must be greater than zero")]
    ZeroCreditHours,
    /// The grades field did not have the form `grades=[...]`.
    #[error("malformed grades field '{0}'")]
    MalformedGrades(String),
    /// The attendance field did not have the form `attendance=<present>/<total>`.
    #[error("malformed attendance field '{0}'")]
    MalformedAttendance(String),
    /// A persisted grade was outside `0..=100`.
    #[error(transparent)]
    GradeOutOfRange(#[from] GradeOutOfRange),
    /// A persisted attendance count had more classes attended than held.
    #[error(transparent)]
    AttendanceExceedsTotal(#[from] AttendanceExceedsTotal),
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, FormatError> {
    let fields: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    if fields.len() < expected {
        return Err(FormatError::MissingFields {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, FormatError> {
    value.parse().map_err(|_: ParseIntError| FormatError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_grade(value: &str) -> Result<Grade, FormatError> {
    let number: f64 = value
        .parse()
        .map_err(|_: ParseFloatError| FormatError::InvalidNumber {
            field: "grade",
            value: value.to_string(),
        })?;
    Ok(Grade::new(number)?)
}

impl LineCodec for Student {
    const FIELDS: usize = 3;

    fn encode(&self) -> String {
        [self.id().as_str(), self.name(), self.section()].join(FIELD_SEPARATOR)
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let fields = split_fields(line, Self::FIELDS)?;
        let id = StudentId::new(fields[0])?;
        Ok(Self::new(id, fields[1], fields[2])?)
    }
}

impl LineCodec for Subject {
    const FIELDS: usize = 3;

    fn encode(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.code(),
            self.name(),
            self.credit_hours()
        )
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let fields = split_fields(line, Self::FIELDS)?;
        let code = SubjectCode::new(fields[0])?;
        let credit_hours =
            NonZeroU32::new(parse_u32("credit hours", fields[2])?).ok_or(FormatError::ZeroCreditHours)?;
        Ok(Self::new(code, fields[1], credit_hours)?)
    }
}

impl LineCodec for EnrollmentEntry {
    const FIELDS: usize = 2;

    fn encode(&self) -> String {
        let codes: Vec<&str> = self.subjects.iter().map(SubjectCode::as_str).collect();
        format!("{}{FIELD_SEPARATOR}{}", self.student, codes.join(","))
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let fields = split_fields(line, Self::FIELDS)?;
        let student = StudentId::new(fields[0])?;
        let subjects = fields[1]
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(SubjectCode::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { student, subjects })
    }
}

impl LineCodec for Record {
    const FIELDS: usize = 4;

    fn encode(&self) -> String {
        let grades: Vec<String> = self.grades().iter().map(ToString::to_string).collect();
        let attendance = self.attendance();
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}grades=[{}]{FIELD_SEPARATOR}attendance={}/{}",
            self.student_id(),
            self.subject_code(),
            grades.join(","),
            attendance.present(),
            attendance.total()
        )
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let fields = split_fields(line, Self::FIELDS)?;
        let key = RecordKey::new(StudentId::new(fields[0])?, SubjectCode::new(fields[1])?);
        let grades = decode_grades(fields[2])?;
        let attendance = decode_attendance(fields[3])?;
        Ok(Self::from_parts(key, grades, attendance))
    }
}

fn decode_grades(field: &str) -> Result<Vec<Grade>, FormatError> {
    let inner = field
        .strip_prefix("grades=")
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix('['))
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| FormatError::MalformedGrades(field.to_string()))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner.split(',').map(|value| parse_grade(value.trim())).collect()
}

fn decode_attendance(field: &str) -> Result<Attendance, FormatError> {
    let (present, total) = field
        .strip_prefix("attendance=")
        .and_then(|rest| rest.split_once('/'))
        .ok_or_else(|| FormatError::MalformedAttendance(field.to_string()))?;

    let present = parse_u32("attendance count", present.trim())?;
    let total = parse_u32("class count", total.trim())?;
    Ok(Attendance::new(present, total)?)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn student_id(s: &str) -> StudentId {
        StudentId::new(s).unwrap()
    }

    fn code(s: &str) -> SubjectCode {
        SubjectCode::new(s).unwrap()
    }

    #[test]
    fn student_round_trip() {
        let student = Student::new(student_id("S1"), "Alice Smith", "A").unwrap();

        let line = student.encode();

        assert_eq!(line, "S1 | Alice Smith | A");
        // Enrollments live in their own file and are not part of the line.
        assert_eq!(Student::decode(&line).unwrap(), student);
    }

    #[test]
    fn subject_round_trip() {
        let subject = Subject::new(code("C1"), "Intro", NonZeroU32::new(3).unwrap()).unwrap();

        let line = subject.encode();

        assert_eq!(line, "C1 | Intro | 3");
        assert_eq!(Subject::decode(&line).unwrap(), subject);
    }

    #[test]
    fn padded_text_is_stored_trimmed_and_round_trips() {
        let student = Student::new(student_id("S1"), " Alice ", " A ").unwrap();
        let subject = Subject::new(code("C1"), "  Intro  ", NonZeroU32::new(3).unwrap()).unwrap();

        assert_eq!(student.encode(), "S1 | Alice | A");
        assert_eq!(Student::decode(&student.encode()).unwrap(), student);
        assert_eq!(subject.encode(), "C1 | Intro | 3");
        assert_eq!(Subject::decode(&subject.encode()).unwrap(), subject);
    }

    #[test]
    fn delimiter_in_name_cannot_reach_a_line() {
        let credit_hours = NonZeroU32::new(3).unwrap();

        assert_eq!(
            Student::new(student_id("S1"), "A|B", "A"),
            Err(InvalidTextError { field: "name" })
        );
        assert_eq!(
            Subject::new(code("C1"), "A | B", credit_hours),
            Err(InvalidTextError { field: "subject name" })
        );
    }

    #[test]
    fn record_round_trip() {
        let key = RecordKey::new(student_id("S1"), code("C1"));
        let grades = vec![Grade::new(80.0).unwrap(), Grade::new(92.5).unwrap()];
        let record = Record::from_parts(key, grades, Attendance::new(12, 14).unwrap());

        let line = record.encode();

        assert_eq!(line, "S1 | C1 | grades=[80.0,92.5] | attendance=12/14");
        assert_eq!(Record::decode(&line).unwrap(), record);
    }

    #[test]
    fn empty_record_round_trip() {
        let record = Record::new(RecordKey::new(student_id("S1"), code("C1")));

        let line = record.encode();

        assert_eq!(line, "S1 | C1 | grades=[] | attendance=0/0");
        assert_eq!(Record::decode(&line).unwrap(), record);
    }

    #[test]
    fn enrollment_round_trip() {
        let entry = EnrollmentEntry {
            student: student_id("S1"),
            subjects: vec![code("C1"), code("C2")],
        };

        let line = entry.encode();

        assert_eq!(line, "S1 | C1,C2");
        assert_eq!(EnrollmentEntry::decode(&line).unwrap(), entry);
    }

    #[test]
    fn decode_tolerates_irregular_whitespace() {
        let record = Record::decode("  S1|C1 |grades=[ 85 , 90.5 ]|  attendance= 3 / 4 \n").unwrap();

        assert_eq!(record.student_id().as_str(), "S1");
        assert_eq!(
            record.grades(),
            &[Grade::new(85.0).unwrap(), Grade::new(90.5).unwrap()]
        );
        assert_eq!(record.attendance(), Attendance::new(3, 4).unwrap());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let student = Student::decode("S1 | Alice | A | something else").unwrap();
        assert_eq!(student.section(), "A");
    }

    #[test_case("S1 | Alice"; "student with two fields")]
    #[test_case(""; "empty line")]
    fn short_student_lines_are_rejected(line: &str) {
        assert!(matches!(
            Student::decode(line),
            Err(FormatError::MissingFields { expected: 3, .. })
        ));
    }

    #[test]
    fn non_numeric_credit_hours_are_rejected() {
        assert_eq!(
            Subject::decode("C1 | Intro | three"),
            Err(FormatError::InvalidNumber {
                field: "credit hours",
                value: "three".to_string()
            })
        );
    }

    #[test]
    fn zero_credit_hours_are_rejected() {
        assert_eq!(
            Subject::decode("C1 | Intro | 0"),
            Err(FormatError::ZeroCreditHours)
        );
    }

    #[test_case("S1 | C1 | grades=[80,x] | attendance=0/0"; "non-numeric grade")]
    #[test_case("S1 | C1 | grades=[120] | attendance=0/0"; "grade out of range")]
    #[test_case("S1 | C1 | 80,90 | attendance=0/0"; "missing grades wrapper")]
    #[test_case("S1 | C1 | grades=[] | attendance=3"; "missing attendance slash")]
    #[test_case("S1 | C1 | grades=[] | attendance=5/4"; "attended more than held")]
    #[test_case("S1 | C1 | grades=[] | present=1/2"; "wrong attendance label")]
    fn corrupt_records_are_rejected(line: &str) {
        assert!(Record::decode(line).is_err());
    }

    #[test]
    fn enrollment_with_no_codes_decodes_empty() {
        let entry = EnrollmentEntry::decode("S1 | ").unwrap();
        assert!(entry.subjects.is_empty());
    }
}
