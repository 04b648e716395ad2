use std::num::NonZeroU32;

use crate::domain::{InvalidTextError, SubjectCode, ids::checked_text};

/// A subject (course) that students can enroll in.
///
/// Subjects are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    code: SubjectCode,
    name: String,
    credit_hours: NonZeroU32,
}

impl Subject {
    /// Creates a subject with a trimmed name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTextError`] if the name contains `|` or a line break.
    pub fn new(
        code: SubjectCode,
        name: &str,
        credit_hours: NonZeroU32,
    ) -> Result<Self, InvalidTextError> {
        Ok(Self {
            code,
            name: checked_text("subject name", name)?,
            credit_hours,
        })
    }

    /// The subject's unique code.
    #[must_use]
    pub const fn code(&self) -> &SubjectCode {
        &self.code
    }

    /// The subject's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The credit-hour weight of the subject.
    #[must_use]
    pub const fn credit_hours(&self) -> NonZeroU32 {
        self.credit_hours
    }
}
