//! Per-run playbook context.
//!
//! Aggregates the configuration of one test run: playbook path, inventory
//! path, the role under test (if any) and the installed-roles directory.
//! Preparing a context performs the full dependency flow: detect sibling
//! roles, read the role's own metadata and the sibling `requirements.yml`,
//! resolve to closure and install. The installed-roles directory is a scoped
//! temporary directory owned by the context and removed on drop, success or
//! failure alike.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::installer::DependencyInstaller;
use crate::meta::RoleMeta;
use crate::requirements::{RequirementsFile, RoleRequirement};
use crate::resolver::{MetaSource, Resolver};

/// Configuration and resources for one playbook test run.
#[derive(Debug)]
pub struct PlaybookContext {
    playbook_path: PathBuf,
    inventory_path: PathBuf,
    role_path: Option<PathBuf>,
    installed_roles_dir: TempDir,
    engine: EngineConfig,
}

impl PlaybookContext {
    /// Builds a context and materializes every dependency role the run
    /// needs. Fails before any execution when metadata is missing or the
    /// installation tool fails.
    pub async fn prepare(
        playbook_path: impl Into<PathBuf>,
        inventory_path: impl Into<PathBuf>,
        role_path: Option<PathBuf>,
        engine: EngineConfig,
    ) -> Result<Self> {
        let ctx = Self {
            playbook_path: playbook_path.into(),
            inventory_path: inventory_path.into(),
            role_path,
            installed_roles_dir: TempDir::new()?,
            engine,
        };
        ctx.install_all_dependencies().await?;
        Ok(ctx)
    }

    /// Path to the playbook under test.
    pub fn playbook_path(&self) -> &Path {
        &self.playbook_path
    }

    /// Path to the inventory the run targets.
    pub fn inventory_path(&self) -> &Path {
        &self.inventory_path
    }

    /// Path to the role under test, when the playbook tests a role.
    pub fn role_path(&self) -> Option<&Path> {
        self.role_path.as_deref()
    }

    /// Directory holding the installed dependency roles.
    pub fn installed_roles_path(&self) -> &Path {
        self.installed_roles_dir.path()
    }

    /// Engine binaries for this run.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Environment for every engine invocation: the role search path lists
    /// the local role base directory (when a role is under test) before the
    /// installed-roles directory, so local roles shadow installed ones.
    /// Fails when a directory cannot be joined into a search path, which
    /// happens when its name contains the path separator.
    pub fn env(&self) -> Result<IndexMap<String, String>> {
        let mut roles_path = Vec::new();
        if let Some(role_path) = &self.role_path {
            if let Some(role_base) = role_path.parent() {
                roles_path.push(role_base.to_path_buf());
            }
        }
        roles_path.push(self.installed_roles_dir.path().to_path_buf());

        let joined = std::env::join_paths(&roles_path)
            .map_err(|e| Error::config(format!("cannot build ANSIBLE_ROLES_PATH: {e}")))?
            .to_string_lossy()
            .into_owned();

        Ok(IndexMap::from([("ANSIBLE_ROLES_PATH".to_string(), joined)]))
    }

    /// Role names available as sibling directories next to the role under
    /// test. These are already resolvable locally and must never be fetched.
    fn sibling_role_names(&self) -> Vec<String> {
        let Some(role_base) = self.role_path.as_deref().and_then(Path::parent) else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(role_base) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    /// Declarations from the `requirements.yml` beside the test playbook,
    /// when present.
    async fn sibling_requirements(&self) -> Result<Vec<RoleRequirement>> {
        let Some(playbook_dir) = self.playbook_path.parent() else {
            return Ok(Vec::new());
        };
        let requirements_path = playbook_dir.join("requirements.yml");
        if !requirements_path.is_file() {
            debug!(path = %requirements_path.display(), "no sibling requirements file");
            return Ok(Vec::new());
        }
        info!(path = %requirements_path.display(), "sibling requirements found");
        Ok(RequirementsFile::from_path(&requirements_path).await?.roles)
    }

    /// Resolves and installs the dependency closure. Each round installs the
    /// current set, then re-resolves through the freshly installed roles'
    /// metadata until the set stops growing.
    async fn install_all_dependencies(&self) -> Result<()> {
        let own_dependencies = match &self.role_path {
            Some(role_path) => RoleMeta::from_role_path(role_path).await?.dependencies,
            None => Vec::new(),
        };

        let resolver = Resolver::new(self.sibling_requirements().await?, self.sibling_role_names());
        let installer = DependencyInstaller::new(self.engine.clone());
        let installed = InstalledRoles::new(self.installed_roles_path());

        let mut resolved = resolver.resolve(&own_dependencies);
        while !resolved.is_empty() {
            installer.install(&resolved, self.installed_roles_path()).await?;
            let expanded = resolver.resolve_to_closure(&own_dependencies, &installed)?;
            if expanded.len() == resolved.len() {
                break;
            }
            resolved = expanded;
        }

        Ok(())
    }
}

/// Metadata lookup over the installed-roles directory. Roles not installed
/// yet, or installed without a metadata file, declare no dependencies;
/// metadata that exists but cannot be parsed is a configuration defect.
#[derive(Debug)]
struct InstalledRoles {
    roles_path: PathBuf,
}

impl InstalledRoles {
    fn new(roles_path: impl Into<PathBuf>) -> Self {
        Self {
            roles_path: roles_path.into(),
        }
    }
}

impl MetaSource for InstalledRoles {
    fn dependencies_of(&self, name: &str) -> Result<Vec<RoleRequirement>> {
        let meta_path = self.roles_path.join(name).join("meta").join("main.yml");
        if !meta_path.is_file() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&meta_path)?;
        let meta = RoleMeta::from_str(&content, &meta_path)?;
        Ok(meta.dependencies)
    }
}
