//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "surge", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export task results to a file, stdout or an http endpoint
    Export {
        /// JSON file with one task result or a list of them
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// File path template, http(s) URL or `-` for stdout
        #[arg(long, value_name = "DESTINATION")]
        destination: Option<String>,

        /// Maximum documents per batch (0 sends each task as one batch)
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,
    },

    /// Print the flattened atomic action records of a workload as JSON lines
    Flatten {
        /// JSON file with one workload result
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Levels of nested actions to keep
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Build the test-runner command and run it, streaming subunit to stdout
    Verify {
        /// Test repository checkout
        #[arg(long, value_name = "PATH")]
        repo_dir: Option<PathBuf>,

        /// Worker count (0 lets the runner decide)
        #[arg(long, value_name = "N")]
        concurrency: Option<u32>,

        /// Only run tests matching this pattern
        #[arg(long, value_name = "REGEX")]
        pattern: Option<String>,

        /// YAML file mapping test patterns to skip reasons
        #[arg(long, value_name = "PATH")]
        skip_list: Option<PathBuf>,

        /// Re-run only the tests that failed last time
        #[arg(long)]
        failed: bool,

        /// Print the runner command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        path: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path; prints to stdout when omitted
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
