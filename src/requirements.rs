//! Requirements file handling.
//!
//! A requirements file is an ordered YAML list of role dependency
//! declarations, each a `{name, src}` map. The legacy plain-string form
//! (`- rolename`) is accepted on read; writing always produces the map form,
//! which is what `ansible-galaxy install --role-file` consumes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One role dependency declaration, from role metadata or a requirements
/// file. Identity is the role name; the source says where to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequirement {
    /// Role name
    pub name: String,
    /// Fetch source (Galaxy name, URL, tarball path); absent means the name
    /// itself is the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl RoleRequirement {
    /// Creates a requirement with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            src: None,
        }
    }

    /// Creates a requirement with a name and an explicit source.
    pub fn with_src(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            src: Some(src.into()),
        }
    }
}

/// Ordered sequence of role dependency declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementsFile {
    /// Declarations in file order
    pub roles: Vec<RoleRequirement>,
}

impl RequirementsFile {
    /// Creates an empty requirements file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a requirements document from YAML text.
    pub fn from_str(content: &str) -> Result<Self> {
        let raw: Vec<RequirementRaw> = serde_yaml::from_str(content)?;
        let roles = raw.into_iter().map(RoleRequirement::from).collect();
        Ok(Self { roles })
    }

    /// Reads a requirements file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read requirements file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "parsed requirements file");
        Self::from_str(&content)
    }

    /// Serializes to a YAML document.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.roles)?)
    }

    /// Writes the requirements document to disk.
    pub async fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_yaml()?;
        tokio::fs::write(path.as_ref(), content).await?;
        Ok(())
    }

    /// Returns true when no declarations are present.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.roles.len()
    }
}

impl FromIterator<RoleRequirement> for RequirementsFile {
    fn from_iter<I: IntoIterator<Item = RoleRequirement>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

// Raw parsing structure: entries can be a plain string or a {name, src} map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequirementRaw {
    Simple(String),
    Full {
        name: String,
        #[serde(default)]
        src: Option<String>,
    },
}

impl From<RequirementRaw> for RoleRequirement {
    fn from(raw: RequirementRaw) -> Self {
        match raw {
            RequirementRaw::Simple(name) => RoleRequirement::named(name),
            RequirementRaw::Full { name, src } => RoleRequirement { name, src },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_map_entries() {
        let yaml = r#"
- name: role1
  src: external-role-base/role1.tar.gz
- name: role2
"#;
        let requirements = RequirementsFile::from_str(yaml).unwrap();
        assert_eq!(requirements.len(), 2);
        assert_eq!(
            requirements.roles[0],
            RoleRequirement::with_src("role1", "external-role-base/role1.tar.gz")
        );
        assert_eq!(requirements.roles[1], RoleRequirement::named("role2"));
    }

    #[test]
    fn test_parse_legacy_string_entries() {
        let yaml = "- geerlingguy.nginx\n- geerlingguy.docker\n";
        let requirements = RequirementsFile::from_str(yaml).unwrap();
        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements.roles[0].name, "geerlingguy.nginx");
        assert_eq!(requirements.roles[0].src, None);
    }

    #[test]
    fn test_parse_preserves_order() {
        let yaml = "- name: c\n- name: a\n- name: b\n";
        let requirements = RequirementsFile::from_str(yaml).unwrap();
        let names: Vec<&str> = requirements.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_to_yaml_writes_map_form() {
        let requirements: RequirementsFile =
            [RoleRequirement::with_src("role1", "https://example.com/role1.tar.gz")]
                .into_iter()
                .collect();
        let yaml = requirements.to_yaml().unwrap();
        assert!(yaml.contains("name: role1"));
        assert!(yaml.contains("src: https://example.com/role1.tar.gz"));
    }

    #[test]
    fn test_roundtrip() {
        let original: RequirementsFile = [
            RoleRequirement::with_src("role1", "base/role1.tar.gz"),
            RoleRequirement::named("role2"),
        ]
        .into_iter()
        .collect();
        let reparsed = RequirementsFile::from_str(&original.to_yaml().unwrap()).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(RequirementsFile::from_str("{not a list").is_err());
    }
}
