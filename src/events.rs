//! Run event stream protocol.
//!
//! The bundled callback plugin marks structured events on the child process
//! stdout with a fixed line prefix, interleaved with the engine's ordinary
//! human-readable output. Each marked line is a single JSON object with an
//! `event_name` and a `data` mapping; everything else passes through
//! untouched. Passthrough is modeled as an explicit variant rather than
//! dropped, so the classifier is testable against synthetic line sources.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Literal prefix marking a structured event line.
pub const EVENT_LINE_PREFIX: &str = "GOODPLAY => ";

/// Outcome of one test task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    /// Task ran and its assertion held
    Passed,
    /// Task ran and failed
    Failed,
    /// Task never ran (condition, early exit, or engine skip)
    Skipped,
}

impl TaskOutcome {
    /// Lowercase wire name, as emitted by the callback plugin.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Passed => "passed",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Skipped => "skipped",
        }
    }
}

/// A structured event emitted by the callback plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A test task is about to run.
    TaskStart {
        /// Task name
        name: String,
    },
    /// A test task finished with an outcome.
    TaskEnd {
        /// Task name
        name: String,
        /// Reported outcome
        outcome: TaskOutcome,
    },
    /// The plugin hit an error condition (e.g. an unresolvable role).
    Error {
        /// Human-readable error message
        message: String,
    },
}

impl RunEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::TaskStart { .. } => "test-task-start",
            RunEvent::TaskEnd { .. } => "test-task-end",
            RunEvent::Error { .. } => "error",
        }
    }

    /// The task this event correlates to, when it carries one.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            RunEvent::TaskStart { name } | RunEvent::TaskEnd { name, .. } => Some(name),
            RunEvent::Error { .. } => None,
        }
    }
}

/// One classified line of child-process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// A structured event line
    Event(RunEvent),
    /// Ordinary engine output, echoed but never interpreted
    Passthrough(String),
}

impl StreamLine {
    /// Classifies one line of combined output. Lines without the event
    /// prefix are passthrough; prefixed lines must decode into a recognized
    /// event or the internal protocol has been violated.
    pub fn classify(line: &str) -> Result<Self> {
        let Some(payload) = line.strip_prefix(EVENT_LINE_PREFIX) else {
            return Ok(StreamLine::Passthrough(line.to_string()));
        };

        let raw: RawEvent = serde_json::from_str(payload)
            .map_err(|e| Error::protocol(format!("undecodable event line {line:?}: {e}")))?;

        let event = match raw.event_name.as_str() {
            "test-task-start" => RunEvent::TaskStart {
                name: raw.data.name.ok_or_else(|| {
                    Error::protocol(format!("test-task-start event without name: {line:?}"))
                })?,
            },
            "test-task-end" => RunEvent::TaskEnd {
                name: raw.data.name.ok_or_else(|| {
                    Error::protocol(format!("test-task-end event without name: {line:?}"))
                })?,
                outcome: raw.data.outcome.ok_or_else(|| {
                    Error::protocol(format!("test-task-end event without outcome: {line:?}"))
                })?,
            },
            "error" => RunEvent::Error {
                message: raw.data.message.ok_or_else(|| {
                    Error::protocol(format!("error event without message: {line:?}"))
                })?,
            },
            other => {
                return Err(Error::protocol(format!("unexpected event '{other}': {line:?}")));
            }
        };

        Ok(StreamLine::Event(event))
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_name: String,
    #[serde(default)]
    data: RawEventData,
}

#[derive(Debug, Default, Deserialize)]
struct RawEventData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    outcome: Option<TaskOutcome>,
    #[serde(default)]
    message: Option<String>,
}
