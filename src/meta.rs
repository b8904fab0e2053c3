//! Role metadata.
//!
//! A role's `meta/main.yml` declares its dependencies (and Galaxy info,
//! which this crate tolerates but does not interpret). A role referenced
//! from a playbook without parsable metadata is a configuration defect.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::requirements::RoleRequirement;

/// Parsed `meta/main.yml` content.
#[derive(Debug, Clone, Default)]
pub struct RoleMeta {
    /// Dependencies declared by the role, in declaration order
    pub dependencies: Vec<RoleRequirement>,
}

impl RoleMeta {
    /// Parses role metadata from YAML text.
    pub fn from_str(content: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let raw: RoleMetaRaw =
            serde_yaml::from_str(content).map_err(|e| Error::RoleMetaParse {
                path: path.into(),
                message: e.to_string(),
            })?;

        let dependencies = raw
            .dependencies
            .into_iter()
            .map(RoleRequirement::from)
            .collect();

        Ok(Self { dependencies })
    }

    /// Reads `meta/main.yml` under the given role directory.
    pub async fn from_role_path(role_path: impl AsRef<Path>) -> Result<Self> {
        let meta_path = role_path.as_ref().join("meta").join("main.yml");
        let content = tokio::fs::read_to_string(&meta_path).await.map_err(|e| {
            Error::RoleMetaParse {
                path: meta_path.clone(),
                message: format!("Failed to read file: {}", e),
            }
        })?;
        debug!(path = %meta_path.display(), "read role metadata");
        Self::from_str(&content, meta_path)
    }
}

// Raw structure: dependencies may be plain strings, {name, src} maps, or the
// `role:` keyword form; galaxy_info and anything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct RoleMetaRaw {
    #[serde(default)]
    dependencies: Vec<DependencyRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyRaw {
    Simple(String),
    Full {
        #[serde(alias = "role")]
        name: String,
        #[serde(default)]
        src: Option<String>,
    },
}

impl From<DependencyRaw> for RoleRequirement {
    fn from(raw: DependencyRaw) -> Self {
        match raw {
            DependencyRaw::Simple(name) => RoleRequirement::named(name),
            DependencyRaw::Full { name, src } => RoleRequirement { name, src },
        }
    }
}
