//! Load balancer functional test runner
//!
//! Runs staged test cases (pre-fetch, pre-validate, trigger,
//! post-validate) against a load-balancer control-plane API.

use clap::Parser;
use commands::Commands;
use lbprobe::{cli, commands};

#[derive(Parser)]
#[command(name = "lbprobe", about = "Load balancer control-plane functional test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
