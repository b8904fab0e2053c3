//! Dependency installation.
//!
//! Wraps the external role-installation tool: the resolved dependency set is
//! written to a requirements document inside the destination directory, then
//! `ansible-galaxy install` is invoked once against it, forcing overwrite of
//! any stale cached copy. A non-zero exit is fatal for the run; retry policy
//! belongs to the caller or the surrounding CI, not to this layer.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::requirements::RequirementsFile;
use crate::resolver::ResolvedDependencySet;

/// Installs resolved dependency roles into a destination directory.
#[derive(Debug, Clone)]
pub struct DependencyInstaller {
    engine: EngineConfig,
}

impl DependencyInstaller {
    /// Creates an installer using the given engine binaries.
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    /// Installs every role in `resolved` into `destination_dir`. The
    /// requirements document is written into the destination directory and
    /// discarded with it. No-op for an empty set.
    pub async fn install(
        &self,
        resolved: &ResolvedDependencySet,
        destination_dir: &Path,
    ) -> Result<()> {
        if resolved.is_empty() {
            debug!("no dependencies to install");
            return Ok(());
        }

        let requirements: RequirementsFile = resolved.values().cloned().collect();
        let requirements_path = destination_dir.join("requirements.yml");
        requirements.write_to_file(&requirements_path).await?;

        debug!(
            count = resolved.len(),
            dest = %destination_dir.display(),
            "installing dependency roles"
        );

        let output = Command::new(&self.engine.galaxy_bin)
            .arg("install")
            .arg("--force")
            .arg("--role-file")
            .arg(&requirements_path)
            .arg("--roles-path")
            .arg(destination_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::config(format!(
                    "Failed to spawn '{}': {}",
                    self.engine.galaxy_bin.display(),
                    e
                ))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!(target: "playtest::galaxy", "{}", line);
        }

        if !output.status.success() {
            return Err(Error::Installation {
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::RoleRequirement;
    use std::os::unix::fs::PermissionsExt;

    fn stub_galaxy(dir: &Path, script: &str) -> std::path::PathBuf {
        let path = dir.join("fake-galaxy");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn resolved_one() -> ResolvedDependencySet {
        let mut set = ResolvedDependencySet::new();
        set.insert(
            "role1".to_string(),
            RoleRequirement::with_src("role1", "base/role1.tar.gz"),
        );
        set
    }

    #[tokio::test]
    async fn test_empty_set_spawns_nothing() {
        let temp = tempfile::tempdir().unwrap();
        // A galaxy binary that would fail if ever invoked.
        let galaxy = stub_galaxy(temp.path(), "exit 1");
        let installer = DependencyInstaller::new(EngineConfig::new("ansible-playbook", galaxy));
        installer
            .install(&ResolvedDependencySet::new(), temp.path())
            .await
            .unwrap();
        assert!(!temp.path().join("requirements.yml").exists());
    }

    #[tokio::test]
    async fn test_writes_requirements_and_invokes_tool() {
        let temp = tempfile::tempdir().unwrap();
        let galaxy = stub_galaxy(temp.path(), r#"echo "args: $@" > "$(dirname "$0")/galaxy.args""#);
        let installer = DependencyInstaller::new(EngineConfig::new("ansible-playbook", galaxy));
        installer.install(&resolved_one(), temp.path()).await.unwrap();

        let requirements = std::fs::read_to_string(temp.path().join("requirements.yml")).unwrap();
        assert!(requirements.contains("name: role1"));
        assert!(requirements.contains("src: base/role1.tar.gz"));

        let args = std::fs::read_to_string(temp.path().join("galaxy.args")).unwrap();
        assert!(args.contains("install"));
        assert!(args.contains("--force"));
        assert!(args.contains("--role-file"));
        assert!(args.contains("--roles-path"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_surfaces_stderr() {
        let temp = tempfile::tempdir().unwrap();
        let galaxy = stub_galaxy(temp.path(), "echo 'galaxy unreachable' >&2; exit 1");
        let installer = DependencyInstaller::new(EngineConfig::new("ansible-playbook", galaxy));
        let err = installer
            .install(&resolved_one(), temp.path())
            .await
            .unwrap_err();
        match err {
            Error::Installation { stderr } => assert!(stderr.contains("galaxy unreachable")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
