use std::{num::NonZeroU32, path::{Path, PathBuf}};

mod init;
mod list;
mod menu;
mod report;
mod terminal;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use list::List;
use registrar::{Registrar, SaveReport, StudentId, SubjectCode};
use report::Report;
use terminal::Colorize;
use tracing::instrument;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the records repository
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new records repository
    Init(init::Command),

    /// Add a new student
    AddStudent(AddStudent),

    /// Add a new subject
    AddSubject(AddSubject),

    /// Enroll a student in a subject
    Enroll(Enroll),

    /// Add a grade (0-100) to an enrollment
    Grade(AddGrade),

    /// Mark attendance for one class of an enrollment
    Attend(Attend),

    /// Show a student's grades and attendance per subject
    Report(Report),

    /// List all students (default)
    List(List),

    /// Check the data files for integrity issues
    Validate(Validate),

    /// Run the interactive menu
    Menu,
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(root)?,
            Self::AddStudent(command) => command.run(root)?,
            Self::AddSubject(command) => command.run(root)?,
            Self::Enroll(command) => command.run(root)?,
            Self::Grade(command) => command.run(root)?,
            Self::Attend(command) => command.run(root)?,
            Self::Report(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Validate(command) => command.run(root)?,
            Self::Menu => menu::run(root)?,
        }
        Ok(())
    }
}

/// Opens the repository, reporting load failures with the root path.
fn open(root: &Path) -> anyhow::Result<Registrar> {
    let (registrar, _report) = Registrar::open(root)
        .with_context(|| format!("Failed to load records from {}", root.display()))?;
    Ok(registrar)
}

/// Fails if any touched data file could not be written.
fn ensure_saved(report: &SaveReport) -> anyhow::Result<()> {
    if let Some(failure) = report.failures().first() {
        anyhow::bail!("{failure}: {}", failure.source);
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
pub struct AddStudent {
    /// The unique student ID
    id: StudentId,

    /// The student's name
    name: String,

    /// The student's section or batch
    section: String,
}

impl AddStudent {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut registrar = open(root)?;
        let saved = registrar.add_student(self.id, &self.name, &self.section)?;
        ensure_saved(&saved)?;

        println!("{}", format!("✅ Student {} added", self.name.trim()).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct AddSubject {
    /// The unique subject code
    code: SubjectCode,

    /// The subject's name
    name: String,

    /// Credit hours (a positive whole number)
    credit_hours: NonZeroU32,
}

impl AddSubject {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut registrar = open(root)?;
        let saved = registrar.add_subject(self.code, &self.name, self.credit_hours)?;
        ensure_saved(&saved)?;

        println!("{}", format!("✅ Subject {} added", self.name.trim()).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Enroll {
    /// The student to enroll
    student: StudentId,

    /// The subject to enroll in
    subject: SubjectCode,
}

impl Enroll {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut registrar = open(root)?;
        let saved = registrar.enroll_student(&self.student, &self.subject)?;
        ensure_saved(&saved)?;

        let collections = registrar.directory().collections();
        let student = collections
            .student(&self.student)
            .map_or(self.student.as_str(), |student| student.name());
        let subject = collections
            .subject(&self.subject)
            .map_or(self.subject.as_str(), |subject| subject.name());
        println!("{}", format!("✅ {student} enrolled in {subject}").success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct AddGrade {
    /// The enrolled student
    student: StudentId,

    /// The subject
    subject: SubjectCode,

    /// The grade, between 0 and 100
    #[arg(allow_negative_numbers = true)]
    grade: f64,
}

impl AddGrade {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut registrar = open(root)?;
        let saved = registrar.add_grade(&self.student, &self.subject, self.grade)?;
        ensure_saved(&saved)?;

        println!("{}", format!("✅ Grade {} added", self.grade).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Attend {
    /// The enrolled student
    student: StudentId,

    /// The subject
    subject: SubjectCode,

    /// Mark the student absent instead of present
    #[arg(long, short)]
    absent: bool,
}

impl Attend {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut registrar = open(root)?;
        let saved = registrar.mark_attendance(&self.student, &self.subject, !self.absent)?;
        ensure_saved(&saved)?;

        let status = if self.absent { "Absent" } else { "Present" };
        println!("{}", format!("✅ Attendance marked as {status}").success());
        Ok(())
    }
}
