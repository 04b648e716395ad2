//! `reg`: a command-line records manager for students, subjects, grades and
//! attendance.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
