//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::config::EngineConfig;
use crate::context::PlaybookContext;
use crate::error::Result;
use crate::events::TaskOutcome;
use crate::runner::PlaybookRunner;
use crate::tasks;

/// Run the test tasks of an Ansible playbook and report their outcomes.
#[derive(Debug, Parser)]
#[command(name = "playtest", version, about)]
pub struct Cli {
    /// Path to the test playbook
    pub playbook: PathBuf,

    /// Path to the inventory the run targets
    #[arg(short, long)]
    pub inventory: PathBuf,

    /// Path to the role under test (enables role dependency handling)
    #[arg(long)]
    pub role: Option<PathBuf>,

    /// Playbook execution binary
    #[arg(long, default_value = "ansible-playbook", env = "PLAYTEST_PLAYBOOK_BIN")]
    pub playbook_bin: PathBuf,

    /// Role installation binary
    #[arg(long, default_value = "ansible-galaxy", env = "PLAYTEST_GALAXY_BIN")]
    pub galaxy_bin: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging verbosity level.
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

/// Runs one playbook end to end and returns the process exit code: 0 when
/// every test task passed and the run recorded no failures, 2 when a test
/// task failed, 1 for run-level failures (including all-skipped runs).
pub async fn execute(cli: &Cli) -> Result<i32> {
    let engine = EngineConfig::new(&cli.playbook_bin, &cli.galaxy_bin);
    engine.ensure_available()?;

    let ctx = PlaybookContext::prepare(
        &cli.playbook,
        &cli.inventory,
        cli.role.clone(),
        engine,
    )
    .await?;

    let test_tasks = tasks::list_test_tasks(&ctx).await?;
    if test_tasks.is_empty() {
        eprintln!(
            "playtest: no test tasks found in '{}'",
            cli.playbook.display()
        );
        return Ok(1);
    }
    info!(count = test_tasks.len(), "running test tasks");

    let mut runner = PlaybookRunner::spawn(&ctx).await?;
    let mut any_failed = false;
    for task in &test_tasks {
        runner.wait_for_task_start(task).await?;
        let outcome = runner.wait_for_task_outcome(task).await?;
        any_failed |= outcome == TaskOutcome::Failed;
        println!("{} ... {}", task.name, outcome.as_str());
    }

    let report = runner.finish().await?;
    for failure in &report.failures {
        eprintln!("playtest: {failure}");
    }

    if any_failed {
        Ok(2)
    } else if report.is_success() {
        Ok(0)
    } else {
        Ok(1)
    }
}
