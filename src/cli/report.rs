use std::{fmt, path::Path};

use clap::Parser;
use registrar::{StudentId, StudentReport};
use serde_json::json;
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show a student's grades and attendance per subject")]
pub struct Report {
    /// The student to report on
    student: StudentId,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Report {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let registrar = super::open(root)?;
        let report = registrar.student_report(&self.student)?;

        match self.output {
            OutputFormat::Pretty => print!("{}", PrettyReport(&report)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&report))?),
        }
        Ok(())
    }
}

/// The text rendering of a [`StudentReport`].
pub struct PrettyReport<'a, 'r>(pub &'r StudentReport<'a>);

impl fmt::Display for PrettyReport<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let student = report.student;

        writeln!(f, "\n{}", terminal::banner("STUDENT REPORT"))?;
        writeln!(f, "Student ID: {}", student.id())?;
        writeln!(f, "Name: {}", student.name())?;
        writeln!(f, "Section: {}", student.section())?;
        writeln!(f, "Total Subjects Enrolled: {}", student.subject_count())?;
        writeln!(f, "{}", terminal::rule('='))?;

        if report.subjects.is_empty() {
            writeln!(f, "\n{}", "No subjects enrolled.".dim())?;
        }

        for summary in &report.subjects {
            let subject = summary.subject;
            let record = summary.record;
            let attendance = record.attendance();

            writeln!(f, "\nSubject: {} ({})", subject.name(), subject.code())?;
            writeln!(f, "Credit Hours: {}", subject.credit_hours())?;

            if record.grades().is_empty() {
                writeln!(f, "Grades: {}", "No grades recorded".dim())?;
            } else {
                let grades: Vec<String> = record.grades().iter().map(ToString::to_string).collect();
                writeln!(f, "Grades: {}", grades.join(", "))?;
                writeln!(f, "Average Grade: {:.2}", summary.average_grade)?;
            }

            writeln!(
                f,
                "Attendance: {}/{} classes",
                attendance.present(),
                attendance.total()
            )?;
            writeln!(
                f,
                "Attendance Percentage: {:.2}%",
                summary.attendance_percentage
            )?;
            writeln!(f, "{}", terminal::rule('-').dim())?;
        }

        Ok(())
    }
}

fn to_json(report: &StudentReport<'_>) -> serde_json::Value {
    let student = report.student;
    let subjects: Vec<_> = report
        .subjects
        .iter()
        .map(|summary| {
            let grades: Vec<f64> = summary.record.grades().iter().map(|g| g.value()).collect();
            let attendance = summary.record.attendance();
            json!({
                "code": summary.subject.code().as_str(),
                "name": summary.subject.name(),
                "credit_hours": summary.subject.credit_hours().get(),
                "grades": grades,
                "average_grade": summary.average_grade,
                "attendance": {
                    "present": attendance.present(),
                    "total": attendance.total(),
                },
                "attendance_percentage": summary.attendance_percentage,
            })
        })
        .collect();

    json!({
        "id": student.id().as_str(),
        "name": student.name(),
        "section": student.section(),
        "subjects": subjects,
    })
}
