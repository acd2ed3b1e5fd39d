#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command-line entry point for campus market-coverage analysis.
//!
//! `campus-map analyze` runs the pipeline non-interactively from flags
//! and an optional JSON configuration file; `campus-map interactive`
//! walks through campus selection and parameters with prompts. Both end
//! in the same execution path: load spreadsheets, run the pipeline with
//! a stage progress bar, and write the map and report outputs.

mod interactive;
mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "campus-map", about = "Campus market-coverage analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis pipeline from flags and an optional config file
    Analyze(run::AnalyzeArgs),
    /// Select campuses and parameters interactively, then run
    Interactive,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = campus_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run::run(&args, &multi)?,
        Commands::Interactive => interactive::run(&multi)?,
    }

    Ok(())
}
