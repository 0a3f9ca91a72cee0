//! filtertest - regression-test harness for packet filter engines
//!
//! Runs a plan of filter test cases against capture files and reports a
//! PASS/FAIL/SKIP verdict per case.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use filtertest::common::config::Config;
use filtertest::common::logging;
use filtertest::{cli, commands};

#[derive(Parser)]
#[command(name = "filtertest", about = "Regression-test harness for packet filter engines")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, &config).await,
        Err(e) => Err(e),
    };

    let code = match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // `exit` skips destructors, so flush the log file first. Timed-out cases
    // may still occupy blocking threads that a normal return would wait on.
    drop(log_guard);
    std::process::exit(code);
}
