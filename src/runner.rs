//! Playbook execution supervisor.
//!
//! Launches the engine as an asynchronous child process with the bundled
//! event-emitting callback plugin enabled, consumes its combined output
//! line-by-line and drives a strict per-task wait protocol: for each test
//! task in enumeration order the driver calls [`PlaybookRunner::wait_for_task_start`]
//! and then [`PlaybookRunner::wait_for_task_outcome`]. An `error` event
//! short-circuits the run; every later wait is a no-op returning `skipped`.
//!
//! The supervisor is generic over its line source so the whole protocol is
//! testable against synthetic byte streams, without a child process.

use std::process::Stdio;

use tempfile::TempDir;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use crate::context::PlaybookContext;
use crate::error::{Error, Result};
use crate::events::{RunEvent, StreamLine, TaskOutcome};
use crate::tasks::Task;

/// Source of the bundled callback plugin, materialized next to the run.
const CALLBACK_PLUGIN_SOURCE: &str = include_str!("../plugins/goodplay.py");

/// Name under which the callback plugin registers itself.
const CALLBACK_PLUGIN_NAME: &str = "goodplay";

/// Final result of one playbook run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Ordered failure messages accumulated during the run
    pub failures: Vec<String>,
    /// True when no test task produced a non-skipped outcome
    pub all_skipped: bool,
}

impl RunReport {
    /// True when the run produced no failures.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Supervisor for one playbook execution. Owns the child process handle and
/// its output stream for the duration of the run.
#[derive(Debug)]
pub struct PlaybookRunner<R> {
    reader: R,
    child: Option<Child>,
    plugin_dir: Option<TempDir>,
    skip_wait: bool,
    failures: Vec<String>,
    all_test_tasks_skipped: bool,
}

impl PlaybookRunner<BufReader<ChildStdout>> {
    /// Spawns the engine for the context's playbook with the callback plugin
    /// enabled, then blocks only until the child has begun producing output.
    pub async fn spawn(ctx: &PlaybookContext) -> Result<Self> {
        let plugin_dir = materialize_callback_plugin()?;

        let mut child = Command::new(&ctx.engine().playbook_bin)
            .arg("--verbose")
            .arg("-i")
            .arg(ctx.inventory_path())
            .arg(ctx.playbook_path())
            .envs(ctx.env()?)
            .env("PYTHONUNBUFFERED", "1")
            .env("ANSIBLE_CALLBACK_PLUGINS", plugin_dir.path())
            .env("ANSIBLE_CALLBACK_WHITELIST", CALLBACK_PLUGIN_NAME)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::config(format!(
                    "Failed to spawn '{}': {}",
                    ctx.engine().playbook_bin.display(),
                    e
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::config("child process has no stdout handle"))?;
        let mut reader = BufReader::new(stdout);

        // Readiness probe: wait until the child buffered its first output.
        let _ = reader.fill_buf().await?;
        debug!(playbook = %ctx.playbook_path().display(), "playbook run started");

        Ok(Self {
            reader,
            child: Some(child),
            plugin_dir: Some(plugin_dir),
            skip_wait: false,
            failures: Vec::new(),
            all_test_tasks_skipped: true,
        })
    }
}

impl<R: AsyncBufRead + Unpin> PlaybookRunner<R> {
    /// Builds a supervisor over a synthetic line source. No child process is
    /// involved; used to exercise the wait protocol in tests.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            child: None,
            plugin_dir: None,
            skip_wait: false,
            failures: Vec::new(),
            all_test_tasks_skipped: true,
        }
    }

    /// Blocks until the start event for `task` arrives, or the run has
    /// short-circuited.
    pub async fn wait_for_task_start(&mut self, task: &Task) -> Result<()> {
        if self.skip_wait {
            return Ok(());
        }
        self.wait_for_event("test-task-start", &task.name).await?;
        Ok(())
    }

    /// Blocks until the end event for `task` arrives and returns its
    /// outcome. Stream end or a prior `error` event yields `Skipped`.
    pub async fn wait_for_task_outcome(&mut self, task: &Task) -> Result<TaskOutcome> {
        if self.skip_wait {
            return Ok(TaskOutcome::Skipped);
        }

        let outcome = match self.wait_for_event("test-task-end", &task.name).await? {
            Some(RunEvent::TaskEnd { outcome, .. }) => outcome,
            // Error short-circuit or stream end without the awaited event:
            // the engine may legitimately skip a task and emit nothing.
            _ => TaskOutcome::Skipped,
        };

        if outcome != TaskOutcome::Skipped {
            self.all_test_tasks_skipped = false;
        }

        Ok(outcome)
    }

    /// Drains remaining output, waits for process exit and finalizes the
    /// report. A run in which every test task was skipped is a failure even
    /// when the child exited zero.
    pub async fn finish(mut self) -> Result<RunReport> {
        // Scan forward through any events left in the stream. A trailing
        // error event is still recorded; any other structured event at this
        // point breaks the protocol.
        if !self.skip_wait {
            while let Some(line) = self.next_line().await? {
                match StreamLine::classify(&line)? {
                    StreamLine::Passthrough(text) => println!("{text}"),
                    StreamLine::Event(RunEvent::Error { message }) => {
                        self.record_error(message);
                        break;
                    }
                    StreamLine::Event(event) => {
                        return Err(Error::protocol(format!(
                            "unexpected trailing event '{}'",
                            event.name()
                        )));
                    }
                }
            }
        }

        // Echo whatever is left without interpreting it.
        loop {
            match self.next_line().await? {
                Some(line) => println!("{line}"),
                None => break,
            }
        }

        if let Some(mut child) = self.child.take() {
            let status = child.wait().await?;
            if !status.success() {
                let code = status.code().unwrap_or(-1);
                warn!(code, "playbook process exited non-zero");
                self.failures
                    .push(format!("playbook process exited with status {code}"));
            }
        }

        if self.all_test_tasks_skipped {
            self.failures
                .push("all test tasks have been skipped".to_string());
        }

        drop(self.plugin_dir.take());

        Ok(RunReport {
            all_skipped: self.all_test_tasks_skipped,
            failures: self.failures,
        })
    }

    /// Scans forward through the stream until an event with the requested
    /// name and task name arrives. Returns `None` when an `error` event
    /// short-circuits the run or the stream ends first. A matching event
    /// name with a different task name, or any other event kind, violates
    /// the internal protocol.
    async fn wait_for_event(
        &mut self,
        event_name: &str,
        task_name: &str,
    ) -> Result<Option<RunEvent>> {
        while let Some(line) = self.next_line().await? {
            let event = match StreamLine::classify(&line)? {
                StreamLine::Passthrough(text) => {
                    println!("{text}");
                    continue;
                }
                StreamLine::Event(event) => event,
            };

            let Some(name) = event.task_name().map(str::to_owned) else {
                // Only the error event carries no task name.
                if let RunEvent::Error { message } = event {
                    self.record_error(message);
                }
                return Ok(None);
            };

            if event.name() != event_name {
                return Err(Error::protocol(format!(
                    "expected {event_name} for task '{task_name}', got '{}'",
                    event.name()
                )));
            }
            if name != task_name {
                return Err(Error::protocol(format!(
                    "expected {event_name} for task '{task_name}', got it for '{name}'"
                )));
            }
            return Ok(Some(event));
        }

        Ok(None)
    }

    fn record_error(&mut self, message: String) {
        warn!(%message, "engine reported an error; skipping remaining waits");
        self.failures.push(message);
        self.skip_wait = true;
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Writes the bundled callback plugin into a scoped directory the engine can
/// load it from.
fn materialize_callback_plugin() -> Result<TempDir> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join(format!("{CALLBACK_PLUGIN_NAME}.py")),
        CALLBACK_PLUGIN_SOURCE,
    )?;
    Ok(dir)
}
