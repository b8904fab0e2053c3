//! Engine configuration.
//!
//! Playtest drives two external binaries: `ansible-playbook` for listing and
//! executing playbooks, and `ansible-galaxy` for installing dependency roles.
//! Both are resolved from `PATH` by default and can be overridden, which is
//! how the test suite substitutes stub executables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Locations of the external engine binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or name of the playbook execution binary
    pub playbook_bin: PathBuf,
    /// Path or name of the role installation binary
    pub galaxy_bin: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playbook_bin: PathBuf::from("ansible-playbook"),
            galaxy_bin: PathBuf::from("ansible-galaxy"),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with explicit binary paths.
    pub fn new(playbook_bin: impl Into<PathBuf>, galaxy_bin: impl Into<PathBuf>) -> Self {
        Self {
            playbook_bin: playbook_bin.into(),
            galaxy_bin: galaxy_bin.into(),
        }
    }

    /// Verifies both binaries can be located, resolving bare names via PATH.
    pub fn ensure_available(&self) -> Result<()> {
        for bin in [&self.playbook_bin, &self.galaxy_bin] {
            which::which(bin)
                .map_err(|_| Error::EngineNotFound(bin.display().to_string()))?;
        }
        Ok(())
    }
}
