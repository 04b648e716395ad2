use std::{
    fs,
    path::{Path, PathBuf},
};

use registrar::{Config, domain::CONFIG_FILE};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Directory for the data files, relative to the repository root
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Fail on malformed lines instead of skipping them
    #[arg(long)]
    strict: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("Repository already initialized (found existing {CONFIG_FILE})");
        }

        fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        let mut config = Config::default();
        config.set_data_dir(&self.data_dir);
        config.allow_malformed_lines = !self.strict;
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        let data_dir = root.join(config.data_dir());
        fs::create_dir_all(&data_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory: {e}"))?;

        println!(
            "{}",
            format!("Initialized records repository in {}", root.display()).success()
        );
        println!("  Created: {CONFIG_FILE}");
        println!("  Created: {}/", self.data_dir.display());

        println!();
        println!("Next steps:");
        println!("  reg add-student S1 \"Your First Student\" A");
        println!("  reg add-subject CS101 \"Intro to Programming\" 3");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn command() -> Command {
        Command {
            data_dir: PathBuf::from("records"),
            strict: true,
        }
    }

    #[test]
    fn writes_config_and_data_dir() {
        let tmp = tempdir().unwrap();

        command().run(tmp.path()).unwrap();

        let config = Config::load(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.data_dir(), Path::new("records"));
        assert!(!config.allow_malformed_lines);
        assert!(tmp.path().join("records").is_dir());
    }

    #[test]
    fn refuses_to_initialize_twice() {
        let tmp = tempdir().unwrap();
        command().run(tmp.path()).unwrap();

        assert!(command().run(tmp.path()).is_err());
    }
}
