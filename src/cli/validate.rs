use std::path::Path;

use clap::Parser;
use registrar::{Registrar, storage::LoadError};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Check the data files for malformed lines and integrity issues")]
pub struct Validate {
    /// Attempt automatic repair of fixable integrity issues
    #[arg(long)]
    fix: bool,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let (mut registrar, report) = match Registrar::open(root) {
            Ok(opened) => opened,
            Err(LoadError::MalformedLines(warnings)) => {
                println!("{}", "Malformed lines (loading is strict):".warning());
                for warning in &warnings {
                    println!("  {warning}");
                }
                std::process::exit(2);
            }
            Err(error) => return Err(error.into()),
        };

        let mut problems = report.warnings().len();
        if !report.is_clean() {
            println!("{}", "Skipped lines:".warning());
            for warning in report.warnings() {
                println!("  {warning}");
            }
        }

        if self.fix {
            let reconciliation = registrar.reconcile();
            super::ensure_saved(&reconciliation.save)?;
            if reconciliation.enrollments_added + reconciliation.records_added > 0 {
                println!(
                    "{}",
                    format!(
                        "✅ Repaired {} enrollment(s) and {} record(s)",
                        reconciliation.enrollments_added, reconciliation.records_added
                    )
                    .success()
                );
            }
        }

        let issues = registrar.integrity_issues();
        problems += issues.len();
        if !issues.is_empty() {
            println!("{}", "Integrity issues:".warning());
            for issue in &issues {
                println!("  {issue}");
            }
            if !self.fix {
                println!("{}", "Run with --fix to repair what can be repaired.".dim());
            }
        }

        if problems > 0 {
            std::process::exit(2);
        }

        println!("{}", "✅ No issues found".success());
        Ok(())
    }
}
