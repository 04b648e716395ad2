use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The name of the configuration file, relative to the repository root.
pub const CONFIG_FILE: &str = "registrar.toml";

/// Configuration for a records repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The directory holding the data files, relative to the repository root.
    data_dir: PathBuf,

    /// Whether malformed lines in the data files are skipped with a warning.
    ///
    /// When `false`, any malformed line makes loading fail instead.
    pub allow_malformed_lines: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            allow_malformed_lines: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads `registrar.toml` from the repository root, falling back to the
    /// defaults if it is missing or invalid.
    #[must_use]
    pub fn load_or_default(root: &Path) -> Self {
        let path = root.join(CONFIG_FILE);
        Self::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Using default config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The data directory, relative to the repository root.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Sets the data directory, relative to the repository root.
    pub fn set_data_dir(&mut self, data_dir: impl Into<PathBuf>) {
        self.data_dir = data_dir.into();
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const fn default_allow_malformed_lines() -> bool {
    true
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,

        #[serde(default = "default_allow_malformed_lines")]
        allow_malformed_lines: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_dir,
                allow_malformed_lines,
            } => Self {
                data_dir,
                allow_malformed_lines,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            data_dir: config.data_dir,
            allow_malformed_lines: config.allow_malformed_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ndata_dir = \"records\"\nallow_malformed_lines = false\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.data_dir(), Path::new("records"));
        assert!(!config.allow_malformed_lines);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nallow_malformed_lines = \"sometimes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.set_data_dir("elsewhere");

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_or_default(tmp.path()), Config::default());
    }
}
