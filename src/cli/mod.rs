//! CLI command handling
//!
//! Loads configuration, wires the HTTP gateway into the scheduler and
//! renders results.

pub mod init;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::{Config, Credentials};
use crate::common::paths::{self, CONFIG_FILE, CREDENTIALS_FILE, TEST_CASES_FILE};
use crate::common::{logging, Error, Result};
use crate::gateway::HttpGateway;
use crate::hooks::TracingHooks;
use crate::testing::{validate_all, ExecutionMode, RunSummary, Scheduler, TestSuite};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub parallel: bool,
    pub test_case: Option<String>,
    pub verbose: bool,
    pub json: bool,
    pub config: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub test_cases: Option<PathBuf>,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            parallel,
            test_case,
            verbose,
            json,
            config,
            credentials,
            test_cases,
        } => {
            run(RunOptions {
                parallel,
                test_case,
                verbose,
                json,
                config,
                credentials,
                test_cases,
            })
            .await
        }

        Commands::Validate { test_cases } => {
            logging::init_plain();
            let path = test_cases.unwrap_or_else(|| paths::resolve(TEST_CASES_FILE));
            let suite = TestSuite::load(&path)?;
            suite.validate()?;
            println!(
                "{} {} test case(s) in {} are valid",
                "✓".green(),
                suite.test_cases.len(),
                path.display()
            );
            Ok(())
        }

        Commands::Init { dir, force } => {
            logging::init_plain();
            for outcome in init::write_defaults(&dir, force)? {
                match outcome {
                    init::InitOutcome::Created(path) => {
                        println!("{} Created {}", "✓".green(), path.display())
                    }
                    init::InitOutcome::Skipped(path) => {
                        println!("  {} already exists, skipped", path.display())
                    }
                }
            }
            println!("\nEdit the credentials file, then run: lbprobe run");
            Ok(())
        }
    }
}

/// Run the configured test cases against the control plane
pub async fn run(opts: RunOptions) -> Result<()> {
    let config_path = opts
        .config
        .unwrap_or_else(|| paths::resolve(CONFIG_FILE));
    let config = Config::load(&config_path)?;

    let _log_guard = logging::init_cli(
        opts.verbose,
        &config.framework.log_dir,
        logging::Console::for_report(opts.json),
    );

    if !opts.json {
        output::print_banner();
    }

    tracing::info!("Loading configuration files");
    let test_cases_path = opts
        .test_cases
        .unwrap_or_else(|| paths::resolve(TEST_CASES_FILE));
    let credentials_path = opts
        .credentials
        .unwrap_or_else(|| paths::resolve(CREDENTIALS_FILE));

    let configs = TestSuite::load(&test_cases_path)?.select(opts.test_case.as_deref())?;
    validate_all(&configs)?;
    let credentials = Credentials::load(&credentials_path)?;

    tracing::info!(base_url = %config.api.base_url, "Authenticating");
    let gateway = HttpGateway::connect(&config.api, &credentials).await?;

    let scheduler = Scheduler::from_config(
        Arc::new(gateway),
        Arc::new(TracingHooks),
        &config.framework,
    );
    let mode = if opts.parallel || config.framework.parallel {
        ExecutionMode::Concurrent
    } else {
        ExecutionMode::Sequential
    };

    tracing::info!(count = configs.len(), ?mode, "Executing test cases");
    let start = Instant::now();
    let results = scheduler.run_all(&configs, mode).await?;
    let summary = RunSummary::from_results(&results, start.elapsed());

    if opts.json {
        output::print_json(&results, &summary)?;
    } else {
        output::print_results(&results);
        output::print_summary(&summary);
    }

    if summary.all_passed() {
        Ok(())
    } else {
        Err(Error::TestsFailed(summary.failed))
    }
}
