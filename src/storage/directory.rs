//! A filesystem backed store of student records
//!
//! The [`Directory`] keeps the four collections in one data directory, one
//! flat file per collection, and wraps the filesystem agnostic
//! [`Collections`].

use std::{
    fmt, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    domain::{Config, Record, Student, Subject},
    storage::{
        codec::{FormatError, LineCodec},
        collections::{Collections, EnrollmentEntry},
    },
};

/// One of the four data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFile {
    /// `students.txt`
    Students,
    /// `subjects.txt`
    Subjects,
    /// `enrollments.txt`
    Enrollments,
    /// `records.txt`
    Records,
}

impl DataFile {
    /// All data files, in load order.
    pub const ALL: [Self; 4] = [
        Self::Students,
        Self::Subjects,
        Self::Enrollments,
        Self::Records,
    ];

    /// The file name within the data directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Students => "students.txt",
            Self::Subjects => "subjects.txt",
            Self::Enrollments => "enrollments.txt",
            Self::Records => "records.txt",
        }
    }
}

impl fmt::Display for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Why a line was skipped during loading.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum LineProblem {
    /// The line could not be decoded.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// An earlier line had the same key; this line replaced it.
    #[error("duplicate key '{0}', the later line wins")]
    DuplicateKey(String),
    /// An enrollment line referred to a student that does not exist.
    #[error("enrollment for unknown student '{0}'")]
    UnknownStudent(String),
}

/// A problem with one line of a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    /// The file containing the line.
    pub file: DataFile,
    /// The 1-based line number.
    pub line: usize,
    /// What was wrong with the line.
    pub problem: LineProblem,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.problem)
    }
}

/// Warnings collected while loading the data files.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// The collected warnings, in file and line order.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Whether every line loaded cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, file: DataFile, line: usize, problem: impl Into<LineProblem>) {
        let warning = LoadWarning {
            file,
            line,
            problem: problem.into(),
        };
        tracing::warn!("Skipping {warning}");
        self.warnings.push(warning);
    }
}

/// Errors that can occur when loading the data files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A data file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// Malformed lines were found and the configuration does not allow them.
    #[error("{} malformed line(s) found", .0.len())]
    MalformedLines(Vec<LoadWarning>),
}

/// A data file could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to save {file}")]
pub struct SaveError {
    /// The file that could not be written.
    pub file: DataFile,
    /// The underlying error.
    #[source]
    pub source: io::Error,
}

/// A filesystem backed store of student records.
#[derive(Debug)]
pub struct Directory {
    /// The data directory holding the four files.
    root: PathBuf,
    config: Config,
    collections: Collections,
}

impl Directory {
    /// Opens a data directory with empty collections, creating the directory
    /// if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: PathBuf, config: Config) -> io::Result<Self> {
        if !root.exists() {
            tracing::info!("Creating data directory {}", root.display());
        }
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            config,
            collections: Collections::default(),
        })
    }

    /// Opens the data directory of a repository and loads everything in it.
    ///
    /// The data directory is `root` joined with the configured `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created, or if
    /// [`Directory::load_all`] fails.
    pub fn open(root: &Path, config: Config) -> Result<(Self, LoadReport), LoadError> {
        let data_dir = root.join(config.data_dir());
        let mut directory = Self::new(data_dir.clone(), config).map_err(|source| LoadError::Io {
            path: data_dir,
            source,
        })?;
        let report = directory.load_all()?;
        Ok((directory, report))
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The in-memory collections.
    #[must_use]
    pub const fn collections(&self) -> &Collections {
        &self.collections
    }

    pub(crate) const fn collections_mut(&mut self) -> &mut Collections {
        &mut self.collections
    }

    /// The full path of a data file.
    #[must_use]
    pub fn path(&self, file: DataFile) -> PathBuf {
        self.root.join(file.file_name())
    }

    /// Loads all four files, in order: students, subjects, enrollments,
    /// records.
    ///
    /// Enrollments are applied to the already-loaded students. Missing files
    /// are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read, or if malformed
    /// lines are found and `allow_malformed_lines` is `false`.
    pub fn load_all(&mut self) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();
        self.load_students(&mut report)?;
        self.load_subjects(&mut report)?;
        self.load_enrollments(&mut report)?;
        self.load_records(&mut report)?;

        if !self.config.allow_malformed_lines && !report.is_clean() {
            return Err(LoadError::MalformedLines(report.warnings));
        }

        for issue in self.collections.integrity_issues() {
            tracing::warn!("Integrity issue: {issue}");
        }

        tracing::debug!(
            "Loaded {} students, {} subjects, {} records from {}",
            self.collections.students().len(),
            self.collections.subjects().len(),
            self.collections.records().len(),
            self.root.display()
        );

        Ok(report)
    }

    /// Loads `students.txt` into the student collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_students(&mut self, report: &mut LoadReport) -> Result<(), LoadError> {
        for (line, student) in self.decode_lines::<Student>(DataFile::Students, report)? {
            if let Some(previous) = self.collections.insert_student(student) {
                report.warn(
                    DataFile::Students,
                    line,
                    LineProblem::DuplicateKey(previous.id().to_string()),
                );
            }
        }
        Ok(())
    }

    /// Loads `subjects.txt` into the subject collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_subjects(&mut self, report: &mut LoadReport) -> Result<(), LoadError> {
        for (line, subject) in self.decode_lines::<Subject>(DataFile::Subjects, report)? {
            if let Some(previous) = self.collections.insert_subject(subject) {
                report.warn(
                    DataFile::Subjects,
                    line,
                    LineProblem::DuplicateKey(previous.code().to_string()),
                );
            }
        }
        Ok(())
    }

    /// Loads `enrollments.txt`, replacing each listed student's subjects.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_enrollments(&mut self, report: &mut LoadReport) -> Result<(), LoadError> {
        for (line, entry) in self.decode_lines::<EnrollmentEntry>(DataFile::Enrollments, report)? {
            let student = entry.student.to_string();
            if !self.collections.apply_enrollment(entry) {
                report.warn(DataFile::Enrollments, line, LineProblem::UnknownStudent(student));
            }
        }
        Ok(())
    }

    /// Loads `records.txt` into the record collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_records(&mut self, report: &mut LoadReport) -> Result<(), LoadError> {
        for (line, record) in self.decode_lines::<Record>(DataFile::Records, report)? {
            if let Some(previous) = self.collections.insert_record(record) {
                report.warn(
                    DataFile::Records,
                    line,
                    LineProblem::DuplicateKey(previous.key().to_string()),
                );
            }
        }
        Ok(())
    }

    /// Reads and decodes every non-blank line of a file, recording lines that
    /// fail to decode in the report.
    ///
    /// A line that fails to decode is skipped on its own; the lines after it
    /// are still loaded. [`Directory::load_all`] turns the skipped lines into
    /// [`LoadError::MalformedLines`] when the config disallows them.
    ///
    /// A missing file decodes as empty. Any other read failure aborts with
    /// [`LoadError::Io`].
    fn decode_lines<T: LineCodec>(
        &self,
        file: DataFile,
        report: &mut LoadReport,
    ) -> Result<Vec<(usize, T)>, LoadError> {
        let path = self.path(file);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        let mut decoded = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match T::decode(line) {
                Ok(value) => decoded.push((index + 1, value)),
                Err(e) => report.warn(file, index + 1, e),
            }
        }
        Ok(decoded)
    }

    /// Rewrites `students.txt` from the in-memory collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_students(&self) -> Result<(), SaveError> {
        self.write_file(
            DataFile::Students,
            self.collections.students().iter().map(Student::encode),
        )
    }

    /// Rewrites `subjects.txt` from the in-memory collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_subjects(&self) -> Result<(), SaveError> {
        self.write_file(
            DataFile::Subjects,
            self.collections.subjects().iter().map(Subject::encode),
        )
    }

    /// Rewrites `enrollments.txt` from the enrollment index.
    ///
    /// Students with no subjects are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_enrollments(&self) -> Result<(), SaveError> {
        self.write_file(
            DataFile::Enrollments,
            self.collections
                .enrollments()
                .iter()
                .filter(|entry| !entry.subjects.is_empty())
                .map(EnrollmentEntry::encode),
        )
    }

    /// Rewrites `records.txt` from the in-memory collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_records(&self) -> Result<(), SaveError> {
        self.write_file(
            DataFile::Records,
            self.collections.records().iter().map(Record::encode),
        )
    }

    /// Rewrites a single data file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, file: DataFile) -> Result<(), SaveError> {
        match file {
            DataFile::Students => self.save_students(),
            DataFile::Subjects => self.save_subjects(),
            DataFile::Enrollments => self.save_enrollments(),
            DataFile::Records => self.save_records(),
        }
    }

    /// Rewrites all four data files, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn save_all(&self) -> Result<(), SaveError> {
        for file in DataFile::ALL {
            self.save(file)?;
        }
        Ok(())
    }

    /// Replaces a file's content by writing to a temporary file in the same
    /// directory and renaming it over the target.
    fn write_file(
        &self,
        file: DataFile,
        lines: impl IntoIterator<Item = String>,
    ) -> Result<(), SaveError> {
        let path = self.path(file);
        write_lines(&self.root, &path, lines).map_err(|source| SaveError { file, source })?;
        tracing::debug!("Saved {}", path.display());
        Ok(())
    }
}

fn write_lines(
    dir: &Path,
    path: &Path,
    lines: impl IntoIterator<Item = String>,
) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Grade, RecordKey, StudentId, SubjectCode};

    fn setup_temp_directory() -> (TempDir, Directory) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let directory = Directory::new(tmp.path().join("data"), Config::default())
            .expect("failed to create data directory");
        (tmp, directory)
    }

    fn reload(directory: &Directory) -> (Directory, LoadReport) {
        let mut fresh = Directory::new(directory.root().to_path_buf(), directory.config().clone())
            .expect("failed to open data directory");
        let report = fresh.load_all().expect("failed to load");
        (fresh, report)
    }

    fn key(student: &str, subject: &str) -> RecordKey {
        RecordKey::new(
            StudentId::new(student).unwrap(),
            SubjectCode::new(subject).unwrap(),
        )
    }

    fn seed(directory: &mut Directory) {
        let collections = directory.collections_mut();
        collections.insert_student(Student::new(StudentId::new("S1").unwrap(), "Alice", "A").unwrap());
        collections.insert_student(Student::new(StudentId::new("S2").unwrap(), "Bob", "B").unwrap());
        collections.insert_subject(Subject::new(
            SubjectCode::new("C1").unwrap(),
            "Intro",
            NonZeroU32::new(3).unwrap(),
        )
        .unwrap());
        collections.enroll(key("S1", "C1"));
        collections.enroll(key("S2", "C1"));
        let record = collections.record_mut(&key("S1", "C1")).unwrap();
        record.add_grade(Grade::new(80.0).unwrap());
        record.add_grade(Grade::new(92.5).unwrap());
        record.mark_attendance(true);
        record.mark_attendance(false);
    }

    #[test]
    fn new_creates_missing_data_directory() {
        let (tmp, directory) = setup_temp_directory();
        assert!(tmp.path().join("data").is_dir());
        assert!(directory.collections().is_empty());
    }

    #[test]
    fn missing_files_load_as_empty() {
        let (_tmp, mut directory) = setup_temp_directory();

        let report = directory.load_all().unwrap();

        assert!(report.is_clean());
        assert!(directory.collections().is_empty());
    }

    #[test]
    fn save_all_then_load_all_round_trips() {
        let (_tmp, mut directory) = setup_temp_directory();
        seed(&mut directory);

        directory.save_all().unwrap();
        let (loaded, report) = reload(&directory);

        assert!(report.is_clean());
        assert_eq!(loaded.collections(), directory.collections());
        assert!(loaded.collections().integrity_issues().is_empty());
    }

    #[test]
    fn saved_files_use_the_pipe_format() {
        let (_tmp, mut directory) = setup_temp_directory();
        seed(&mut directory);

        directory.save_all().unwrap();

        let read = |file| fs::read_to_string(directory.path(file)).unwrap();
        assert_eq!(read(DataFile::Students), "S1 | Alice | A\nS2 | Bob | B\n");
        assert_eq!(read(DataFile::Subjects), "C1 | Intro | 3\n");
        assert_eq!(read(DataFile::Enrollments), "S1 | C1\nS2 | C1\n");
        assert_eq!(
            read(DataFile::Records),
            "S1 | C1 | grades=[80.0,92.5] | attendance=1/2\nS2 | C1 | grades=[] | attendance=0/0\n"
        );
    }

    #[test]
    fn save_rewrites_the_whole_file() {
        let (_tmp, mut directory) = setup_temp_directory();
        seed(&mut directory);
        directory.save_students().unwrap();
        directory.save_students().unwrap();

        let content = fs::read_to_string(directory.path(DataFile::Students)).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn enrollments_rebuild_student_subject_lists() {
        let (_tmp, mut directory) = setup_temp_directory();
        fs::write(directory.path(DataFile::Students), "S1 | Alice | A\n").unwrap();
        fs::write(directory.path(DataFile::Enrollments), "S1 | C1, C2\n").unwrap();

        directory.load_all().unwrap();

        let student = directory
            .collections()
            .student(&StudentId::new("S1").unwrap())
            .unwrap();
        let codes: Vec<&str> = student
            .enrolled_subjects()
            .iter()
            .map(SubjectCode::as_str)
            .collect();
        assert_eq!(codes, ["C1", "C2"]);
    }

    #[test]
    fn malformed_lines_are_skipped_and_reported() {
        let (_tmp, mut directory) = setup_temp_directory();
        fs::write(
            directory.path(DataFile::Subjects),
            "C1 | Intro | 3\nC2 | Broken | lots\n\nC3 | Short\nC4 | Fine | 2\n",
        )
        .unwrap();

        let report = directory.load_all().unwrap();

        let codes: Vec<&str> = directory
            .collections()
            .subjects()
            .iter()
            .map(|subject| subject.code().as_str())
            .collect();
        assert_eq!(codes, ["C1", "C4"]);

        let lines: Vec<(DataFile, usize)> = report
            .warnings()
            .iter()
            .map(|warning| (warning.file, warning.line))
            .collect();
        assert_eq!(lines, [(DataFile::Subjects, 2), (DataFile::Subjects, 4)]);
    }

    #[test]
    fn strict_config_rejects_malformed_lines() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.allow_malformed_lines = false;
        let mut directory = Directory::new(tmp.path().to_path_buf(), config).unwrap();
        fs::write(directory.path(DataFile::Students), "S1 | Alice\n").unwrap();

        let error = directory.load_all().unwrap_err();

        assert!(matches!(error, LoadError::MalformedLines(ref warnings) if warnings.len() == 1));
    }

    #[test]
    fn duplicate_keys_keep_the_later_line() {
        let (_tmp, mut directory) = setup_temp_directory();
        fs::write(
            directory.path(DataFile::Students),
            "S1 | Alice | A\nS2 | Bob | B\nS1 | Alicia | C\n",
        )
        .unwrap();

        let report = directory.load_all().unwrap();

        let students = directory.collections().students();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name(), "Alicia");
        assert_eq!(
            report.warnings()[0].problem,
            LineProblem::DuplicateKey("S1".to_string())
        );
    }

    #[test]
    fn enrollment_for_unknown_student_is_skipped() {
        let (_tmp, mut directory) = setup_temp_directory();
        fs::write(directory.path(DataFile::Enrollments), "GHOST | C1\n").unwrap();

        let report = directory.load_all().unwrap();

        assert!(directory.collections().enrollments().is_empty());
        assert_eq!(
            report.warnings()[0].problem,
            LineProblem::UnknownStudent("GHOST".to_string())
        );
    }

    #[test]
    fn open_uses_configured_data_dir() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.set_data_dir("records");

        let (directory, _report) = Directory::open(tmp.path(), config).unwrap();

        assert_eq!(directory.root(), tmp.path().join("records"));
        assert!(tmp.path().join("records").is_dir());
    }

    #[test]
    fn save_reports_failure_when_directory_is_gone() {
        let (tmp, mut directory) = setup_temp_directory();
        seed(&mut directory);
        fs::remove_dir_all(tmp.path().join("data")).unwrap();

        let error = directory.save_students().unwrap_err();

        assert_eq!(error.file, DataFile::Students);
        // In-memory state is untouched by the failed save.
        assert_eq!(directory.collections().students().len(), 2);
    }
    #[test]
    fn unreadable_file_fails_with_its_path() {
        let (_tmp, mut directory) = setup_temp_directory();
        let students = directory.path(DataFile::Students);
        fs::create_dir(&students).unwrap();

        let error = directory.load_all().unwrap_err();

        match error {
            LoadError::Io { path, .. } => assert_eq!(path, students),
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }
}
