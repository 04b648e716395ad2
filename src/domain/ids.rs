use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;

/// Characters that may never appear in an identifier.
///
/// `|` separates fields and `,` separates subject codes in the enrollment
/// file; line breaks separate records.
const RESERVED: &[char] = &['|', ',', '\n', '\r'];

/// Error returned when a string is not a usable identifier.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InvalidIdError {
    /// The identifier was empty (after trimming whitespace).
    #[error("{kind} must not be empty")]
    Empty {
        /// What was being parsed (e.g. "student ID").
        kind: &'static str,
    },
    /// The identifier contained a field or record delimiter.
    #[error("{kind} '{value}' must not contain '|', ',' or line breaks")]
    ReservedCharacter {
        /// What was being parsed (e.g. "student ID").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Error returned when a name or section cannot be stored on one line.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("{field} must not contain '|' or line breaks")]
pub struct InvalidTextError {
    /// The name of the rejected field.
    pub field: &'static str,
}

/// Trims a free-text field and rejects the field and record delimiters.
pub(crate) fn checked_text(field: &'static str, value: &str) -> Result<String, InvalidTextError> {
    let value = value.trim();
    if value.contains(['|', '\n', '\r']) {
        return Err(InvalidTextError { field });
    }
    Ok(value.to_string())
}

fn validate(kind: &'static str, value: &str) -> Result<NonEmptyString, InvalidIdError> {
    let trimmed = value.trim();
    if trimmed.contains(RESERVED) {
        return Err(InvalidIdError::ReservedCharacter {
            kind,
            value: trimmed.to_string(),
        });
    }
    NonEmptyString::new(trimmed.to_string()).map_err(|_| InvalidIdError::Empty { kind })
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(NonEmptyString);

        impl $name {
            /// Creates a new identifier, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns [`InvalidIdError`] if the trimmed string is empty or
            /// contains a reserved delimiter.
            pub fn new(value: &str) -> Result<Self, InvalidIdError> {
                validate($kind, value).map(Self)
            }

            /// Returns the string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.as_str().hash(state);
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = InvalidIdError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

identifier!(
    /// The unique identifier of a student (e.g. `S1`, `2024-017`).
    StudentId,
    "student ID"
);

identifier!(
    /// The unique code of a subject (e.g. `CS101`).
    SubjectCode,
    "subject code"
);

/// The composite key of a [`Record`](super::Record): one per enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    student: StudentId,
    subject: SubjectCode,
}

impl RecordKey {
    /// Pairs a student with a subject.
    #[must_use]
    pub const fn new(student: StudentId, subject: SubjectCode) -> Self {
        Self { student, subject }
    }

    /// The enrolled student.
    #[must_use]
    pub const fn student(&self) -> &StudentId {
        &self.student
    }

    /// The subject the student is enrolled in.
    #[must_use]
    pub const fn subject(&self) -> &SubjectCode {
        &self.subject
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.student, self.subject)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    #[test]
    fn identifiers_are_trimmed() {
        let id = StudentId::new("  S1 ").unwrap();
        assert_eq!(id.as_str(), "S1");
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace only")]
    fn empty_identifier_is_rejected(input: &str) {
        assert_eq!(
            StudentId::new(input),
            Err(InvalidIdError::Empty { kind: "student ID" })
        );
    }

    #[test_case("S|1"; "pipe")]
    #[test_case("C1,C2"; "comma")]
    #[test_case("S\n1"; "newline")]
    fn delimiters_are_rejected(input: &str) {
        assert!(matches!(
            SubjectCode::new(input),
            Err(InvalidIdError::ReservedCharacter { .. })
        ));
    }

    #[test]
    fn keys_containing_underscores_do_not_collide() {
        // "A_B" + "C" and "A" + "B_C" would collide under a joined string key.
        let first = RecordKey::new(StudentId::new("A_B").unwrap(), SubjectCode::new("C").unwrap());
        let second = RecordKey::new(StudentId::new("A").unwrap(), SubjectCode::new("B_C").unwrap());

        let mut map = HashMap::new();
        map.insert(first.clone(), 1);
        map.insert(second.clone(), 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&first], 1);
        assert_eq!(map[&second], 2);
    }
}
