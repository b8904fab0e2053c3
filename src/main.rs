//! Playtest - a test runner for Ansible roles and playbooks.
//!
//! This is the main entry point for the Playtest CLI.

use anyhow::Result;
use playtest::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity());

    let exit_code = match cli::execute(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("playtest: {e}");
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
