//! The interactive menu.

use std::{fmt, num::NonZeroU32, path::Path};

use dialoguer::{Input, Select};
use registrar::{OperationError, Registrar, SaveReport, StudentId, SubjectCode};
use tracing::instrument;

use super::{list, report, terminal::Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    AddStudent,
    AddSubject,
    Enroll,
    AddGrade,
    MarkAttendance,
    Report,
    ListStudents,
    Exit,
}

impl Action {
    const ALL: [Self; 8] = [
        Self::AddStudent,
        Self::AddSubject,
        Self::Enroll,
        Self::AddGrade,
        Self::MarkAttendance,
        Self::Report,
        Self::ListStudents,
        Self::Exit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddStudent => "Add Student",
            Self::AddSubject => "Add Subject",
            Self::Enroll => "Enroll Student in Subject",
            Self::AddGrade => "Add Grade",
            Self::MarkAttendance => "Mark Attendance",
            Self::Report => "Generate Student Report",
            Self::ListStudents => "List All Students",
            Self::Exit => "Exit",
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Presence {
    Present,
    Absent,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        })
    }
}

/// Runs the menu until the user exits, then saves every data file.
#[instrument]
pub fn run(root: &Path) -> anyhow::Result<()> {
    let mut registrar = super::open(root)?;

    loop {
        println!("\n{}", "STUDENT RECORDS MANAGEMENT SYSTEM".info());
        let selection = Select::new()
            .with_prompt("Choose an option")
            .items(&Action::ALL)
            .default(0)
            .interact()?;

        match Action::ALL[selection] {
            Action::AddStudent => {
                let id: StudentId = Input::new().with_prompt("Student ID").interact_text()?;
                let name: String = Input::new().with_prompt("Student name").interact_text()?;
                let section: String = Input::new()
                    .with_prompt("Section/Batch")
                    .interact_text()?;
                let message = format!("Student {} added", name.trim());
                announce(registrar.add_student(id, &name, &section), &message);
            }
            Action::AddSubject => {
                let code: SubjectCode = Input::new().with_prompt("Subject code").interact_text()?;
                let name: String = Input::new().with_prompt("Subject name").interact_text()?;
                let credit_hours: NonZeroU32 =
                    Input::new().with_prompt("Credit hours").interact_text()?;
                let message = format!("Subject {} added", name.trim());
                announce(registrar.add_subject(code, &name, credit_hours), &message);
            }
            Action::Enroll => {
                let (student, subject) = prompt_pair()?;
                let message = format!("{student} enrolled in {subject}");
                announce(registrar.enroll_student(&student, &subject), &message);
            }
            Action::AddGrade => {
                let (student, subject) = prompt_pair()?;
                let grade: f64 = Input::new()
                    .with_prompt("Grade (0-100)")
                    .interact_text()?;
                let message = format!("Grade {grade} added");
                announce(registrar.add_grade(&student, &subject, grade), &message);
            }
            Action::MarkAttendance => {
                let (student, subject) = prompt_pair()?;
                let options = [Presence::Present, Presence::Absent];
                let choice = Select::new()
                    .with_prompt("Attendance")
                    .items(&options)
                    .default(0)
                    .interact()?;
                let presence = options[choice];
                let message = format!("Attendance marked as {presence}");
                announce(
                    registrar.mark_attendance(
                        &student,
                        &subject,
                        matches!(presence, Presence::Present),
                    ),
                    &message,
                );
            }
            Action::Report => {
                let id: StudentId = Input::new().with_prompt("Student ID").interact_text()?;
                match registrar.student_report(&id) {
                    Ok(student_report) => print!("{}", report::PrettyReport(&student_report)),
                    Err(error) => println!("{}", format!("❌ {error}").warning()),
                }
            }
            Action::ListStudents => {
                print!("{}", list::StudentTable(registrar.list_all_students()));
            }
            Action::Exit => {
                let saved = registrar.save_all();
                if saved.is_complete() {
                    println!("{}", "Data saved.".success());
                } else {
                    println!("{}", "Some data files could not be saved.".warning());
                }
                return Ok(());
            }
        }
    }
}

fn prompt_pair() -> anyhow::Result<(StudentId, SubjectCode)> {
    let student = Input::new().with_prompt("Student ID").interact_text()?;
    let subject = Input::new().with_prompt("Subject code").interact_text()?;
    Ok((student, subject))
}

/// Prints the outcome of an operation. Failures are shown and the menu carries on.
fn announce(result: Result<SaveReport, OperationError>, success: &str) {
    match result {
        Ok(saved) if saved.is_complete() => println!("{}", format!("✅ {success}").success()),
        Ok(saved) => {
            println!("{}", format!("✅ {success}").success());
            for failure in saved.failures() {
                println!(
                    "{}",
                    format!("⚠️  {failure}; the change is kept until the next save").warning()
                );
            }
        }
        Err(error) => println!("{}", format!("❌ {error}").warning()),
    }
}
