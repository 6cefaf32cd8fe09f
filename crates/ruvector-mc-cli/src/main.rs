//! ruvector-mc - Monte Carlo linear solver command-line driver
//!
//! ## Commands
//!
//! - `ruvector-mc solve <task>` - Estimate the components named by a task file
//! - `ruvector-mc merge <outputs>...` - Merge task outputs into one solution
//! - `ruvector-mc generate` - Write a random system as a set of work units
//! - `ruvector-mc demo` - Solve a random system locally and compare against
//!   a direct solve
//!
//! Exit codes: `0` on success, `1` on a hard failure, `2` when a merge pass
//! failed but may succeed once more outputs arrive.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use ruvector_mc_solver::error::MergeError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{demo, generate, merge, solve};
use config::McConfig;

/// Ulam-von Neumann Monte Carlo solver for Ax = b
#[derive(Parser)]
#[command(name = "ruvector-mc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, env = "RUVECTOR_MC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the components named by a task file
    Solve {
        /// Task input file
        input: PathBuf,

        /// Write the task output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the walk count from the task file
        #[arg(short, long)]
        walks: Option<u64>,

        /// Generator seed (0 = OS entropy)
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Per-step termination probability
        #[arg(long)]
        termination_prob: Option<f64>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Merge task outputs into one solution
    ///
    /// Outputs are taken in the order given; the n-th file gets result
    /// identity n unless written as `ID=PATH`.
    Merge {
        /// Task output files (`PATH` or `ID=PATH`)
        #[arg(required = true)]
        outputs: Vec<String>,

        /// Task identity used in the audit record
        #[arg(short, long, default_value = "task")]
        task: String,

        /// Write the merged solution here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep agreeing components of a partly conflicting output
        #[arg(long)]
        per_index: bool,

        /// Relative tolerance for overlapping components
        #[arg(long)]
        tolerance: Option<f64>,

        /// Append merge events as JSON lines to this file
        #[arg(long)]
        events: Option<PathBuf>,

        /// Write the audit record as JSON to this file
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Write a random diagonally dominant system as work units
    Generate {
        /// System dimension
        #[arg(short = 'n', long)]
        dim: usize,

        /// Number of work units
        #[arg(short, long, default_value = "1")]
        units: usize,

        /// Walks per component (default from the configuration)
        #[arg(short, long)]
        walks: Option<u64>,

        /// Generator seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Solve a random system locally and compare against a direct solve
    Demo {
        /// System dimension
        #[arg(short = 'n', long, default_value = "10")]
        dim: usize,

        /// Number of work units to split the system into
        #[arg(short, long, default_value = "2")]
        units: usize,

        /// Walks per component (default from the configuration)
        #[arg(short, long)]
        walks: Option<u64>,

        /// Generator seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(cli.verbose)
                .with_writer(std::io::stderr),
        )
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = McConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Solve {
            input,
            output,
            walks,
            seed,
            termination_prob,
            no_progress,
        } => solve::run(
            &config,
            solve::SolveArgs {
                input,
                output,
                walks,
                seed,
                termination_prob,
                progress: !no_progress,
            },
        ),
        Commands::Merge {
            outputs,
            task,
            output,
            per_index,
            tolerance,
            events,
            audit,
        } => merge::run(
            &config,
            merge::MergeArgs {
                outputs,
                task,
                output,
                per_index,
                tolerance,
                events,
                audit,
            },
        ),
        Commands::Generate {
            dim,
            units,
            walks,
            seed,
            out_dir,
        } => generate::run(&config, dim, units, walks, seed, &out_dir),
        Commands::Demo {
            dim,
            units,
            walks,
            seed,
        } => demo::run(&config, dim, units, walks, seed),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let retryable = e
                .downcast_ref::<MergeError>()
                .is_some_and(MergeError::is_retryable);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if retryable {
                eprintln!("{}", "Merge is retryable once more outputs arrive".yellow());
                ExitCode::from(2)
            } else {
                if !cli.verbose {
                    eprintln!("{}", "Run with --verbose for more details".dimmed());
                }
                ExitCode::FAILURE
            }
        }
    }
}
