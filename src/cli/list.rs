use std::{fmt, path::Path};

use clap::{Parser, ValueEnum};
use registrar::{Student, SubjectCode};
use serde::Serialize;
use tracing::instrument;

use super::terminal::{self, Colorize};

/// Command arguments for `reg list`.
#[derive(Debug, Default, Parser)]
#[command(about = "List all students")]
pub struct List {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One row of the listing.
#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    name: &'a str,
    section: &'a str,
    subjects: Vec<&'a str>,
}

impl<'a> From<&'a Student> for Row<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            id: student.id().as_str(),
            name: student.name(),
            section: student.section(),
            subjects: student
                .enrolled_subjects()
                .iter()
                .map(SubjectCode::as_str)
                .collect(),
        }
    }
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let registrar = super::open(root)?;
        let students = registrar.list_all_students();

        match self.output {
            OutputFormat::Table => print!("{}", StudentTable(students)),
            OutputFormat::Json => {
                let rows: Vec<Row<'_>> = students.iter().map(Row::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }
        Ok(())
    }
}

/// The text rendering of a list of students.
pub struct StudentTable<'a>(pub &'a [Student]);

impl fmt::Display for StudentTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let students = self.0;
        if students.is_empty() {
            return writeln!(f, "{}", "No students in the system yet.".dim());
        }

        writeln!(f, "\n{}", terminal::banner("ALL STUDENTS"))?;
        for student in students {
            writeln!(f, "\nID: {}", student.id())?;
            writeln!(f, "Name: {}", student.name())?;
            writeln!(f, "Section: {}", student.section())?;
            writeln!(f, "Subjects Enrolled: {}", student.subject_count())?;
            writeln!(f, "{}", terminal::rule('-').dim())?;
        }
        writeln!(f, "\nTotal: {} student(s)", students.len())
    }
}

#[cfg(test)]
mod tests {
    use registrar::StudentId;

    use super::*;

    #[test]
    fn empty_listing_says_so() {
        assert!(StudentTable(&[]).to_string().contains("No students in the system yet."));
    }

    #[test]
    fn table_lists_students_in_order() {
        let students = [
            Student::new(StudentId::new("S2").unwrap(), "Bob", "B").unwrap(),
            Student::new(StudentId::new("S1").unwrap(), "Alice", "A").unwrap(),
        ];

        let text = StudentTable(&students).to_string();

        let bob = text.find("Name: Bob").expect("Bob should be listed");
        let alice = text.find("Name: Alice").expect("Alice should be listed");
        assert!(bob < alice);
        assert!(text.contains("Subjects Enrolled: 0"));
        assert!(text.contains("Total: 2 student(s)"));
    }

    #[test]
    fn json_rows_include_enrollments() {
        let student = Student::new(StudentId::new("S1").unwrap(), "Alice", "A").unwrap();

        let value = serde_json::to_value(Row::from(&student)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "id": "S1",
                "name": "Alice",
                "section": "A",
                "subjects": [],
            })
        );
    }
}
