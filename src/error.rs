//! Error types for Playtest.
//!
//! This module defines the error taxonomy used throughout Playtest. Setup
//! failures (bad metadata, failed installs, failed enumeration) surface here
//! as typed errors; per-run failures observed during playbook execution are
//! accumulated on the run report instead, so one playbook's failure does not
//! abort its siblings.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Playtest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Playtest.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Bad or missing configuration input (role metadata, requirements file,
    /// unresolvable dependency declaration).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A role declared in the playbook has no parsable metadata file.
    #[error("Failed to parse role metadata '{path}': {message}")]
    RoleMetaParse {
        /// Path to the meta/main.yml file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The external engine binary could not be located.
    #[error("Engine binary '{0}' not found on PATH")]
    EngineNotFound(String),

    // ========================================================================
    // Installation Errors
    // ========================================================================
    /// The external role-installation tool exited non-zero.
    #[error("Role installation failed: {stderr}")]
    Installation {
        /// Captured stderr of the installation tool
        stderr: String,
    },

    // ========================================================================
    // Enumeration Errors
    // ========================================================================
    /// The task-listing invocation of the external engine exited non-zero.
    #[error("Task enumeration failed for '{playbook}': {stderr}")]
    Enumeration {
        /// Path to the playbook being listed
        playbook: PathBuf,
        /// Captured stderr of the engine, verbatim
        stderr: String,
    },

    /// Two test tasks within one playbook share a name.
    #[error("Playbook '{playbook}' contains tests with non-unique name '{name}'")]
    DuplicateTaskName {
        /// Path to the offending playbook
        playbook: PathBuf,
        /// The duplicated task name
        name: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The bundled callback plugin emitted something the supervisor does not
    /// understand. Always a programming defect, never user-recoverable.
    #[error("Event protocol violation: {0}")]
    ProtocolViolation(String),

    // ========================================================================
    // IO / Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a protocol violation error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Creates a duplicate task name error.
    pub fn duplicate_task_name(playbook: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::DuplicateTaskName {
            playbook: playbook.into(),
            name: name.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::RoleMetaParse { .. } | Error::EngineNotFound(_) => 4,
            Error::Installation { .. } => 3,
            Error::Enumeration { .. } | Error::DuplicateTaskName { .. } => 5,
            Error::ProtocolViolation(_) => 70,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::config("bad meta").exit_code(), 4);
        assert_eq!(
            Error::Installation {
                stderr: "galaxy down".to_string()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::duplicate_task_name("p.yml", "t").exit_code(), 5);
        assert_eq!(Error::protocol("unexpected event").exit_code(), 70);
    }

    #[test]
    fn test_duplicate_task_name_display() {
        let err = Error::duplicate_task_name("tests/test_playbook.yml", "assert run");
        let message = err.to_string();
        assert!(message.contains("test_playbook.yml"));
        assert!(message.contains("assert run"));
    }
}
