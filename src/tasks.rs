//! Task enumeration.
//!
//! Runs the engine's dry listing mode (`--list-tasks --list-tags`) and
//! recovers task names and tags from its plain-text output, keeping only
//! tasks tagged `test`. Test task names must be unique within one playbook;
//! a duplicate is an authoring defect reported before any execution.

use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::context::PlaybookContext;
use crate::error::{Error, Result};

/// The tag marking a task as a test.
pub const TEST_TAG: &str = "test";

// Listing lines look like:
//       task name\tTAGS: [tag1, tag2]
// (six leading spaces, tab before the tag marker). Anything else is
// decorative output from the engine.
static TAGGED_TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {6}(?P<name>.*?)\tTAGS: \[(?P<tags>.+?)\]$").unwrap());

/// A task discovered in the playbook listing. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Task name, unique among test tasks within one playbook
    pub name: String,
    /// Tags carried by the task
    pub tags: Vec<String>,
}

impl Task {
    /// True when the task carries the `test` tag.
    pub fn is_test(&self) -> bool {
        self.tags.iter().any(|tag| tag == TEST_TAG)
    }
}

/// Parses the listing output into tasks, in listing order. Non-matching
/// lines are ignored.
pub fn parse_task_listing(output: &str) -> Vec<Task> {
    output
        .lines()
        .filter_map(|line| {
            let captures = TAGGED_TASK_RE.captures(line)?;
            let name = captures["name"].to_string();
            let tags = captures["tags"]
                .split(',')
                .map(|tag| tag.trim().to_string())
                .collect();
            Some(Task { name, tags })
        })
        .collect()
}

/// Fails when two retained test tasks share a name.
pub fn ensure_unique_task_names(playbook: &std::path::Path, tasks: &[Task]) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for task in tasks {
        if !seen.insert(task.name.as_str()) {
            return Err(Error::duplicate_task_name(playbook, task.name.clone()));
        }
    }
    Ok(())
}

/// Enumerates the test tasks of the context's playbook by invoking the
/// engine in dry listing mode with the context environment, so role lookups
/// resolve against both the local role base and the installed dependencies.
pub async fn list_test_tasks(ctx: &PlaybookContext) -> Result<Vec<Task>> {
    let output = Command::new(&ctx.engine().playbook_bin)
        .arg("--list-tasks")
        .arg("--list-tags")
        .arg("-i")
        .arg(ctx.inventory_path())
        .arg(ctx.playbook_path())
        .envs(ctx.env()?)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            Error::config(format!(
                "Failed to spawn '{}': {}",
                ctx.engine().playbook_bin.display(),
                e
            ))
        })?;

    if !output.status.success() {
        return Err(Error::Enumeration {
            playbook: ctx.playbook_path().to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let test_tasks: Vec<Task> = parse_task_listing(&stdout)
        .into_iter()
        .filter(Task::is_test)
        .collect();

    debug!(
        playbook = %ctx.playbook_path().display(),
        count = test_tasks.len(),
        "enumerated test tasks"
    );

    ensure_unique_task_names(ctx.playbook_path(), &test_tasks)?;
    Ok(test_tasks)
}
