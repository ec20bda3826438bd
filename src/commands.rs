//! CLI command definitions
//!
//! Defines the clap commands for the test runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate and run test cases against the control plane
    Run {
        /// Execute test cases concurrently
        #[arg(long)]
        parallel: bool,

        /// Run only the test case with this name
        #[arg(long = "test-case")]
        test_case: Option<String>,

        /// Enable debug logging
        #[arg(long, short)]
        verbose: bool,

        /// Print results as JSON instead of the console summary
        #[arg(long)]
        json: bool,

        /// Runner configuration file (default: config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Credentials file (default: credentials.toml)
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Test case definitions file (default: test_cases.yaml)
        #[arg(long = "test-cases")]
        test_cases: Option<PathBuf>,
    },

    /// Check test case definitions without contacting the API
    Validate {
        /// Test case definitions file (default: test_cases.yaml)
        #[arg(long = "test-cases")]
        test_cases: Option<PathBuf>,
    },

    /// Write default configuration, credentials and test case files
    Init {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}
