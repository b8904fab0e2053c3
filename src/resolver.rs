//! Dependency resolution.
//!
//! Determines, for a role under test, the final ordered, deduplicated set of
//! dependency roles to install before execution. Three candidate sources are
//! merged per role name, highest precedence first:
//!
//! 1. a sibling directory next to the role under test — the role is already
//!    available locally, so fetching anything by that name is suppressed;
//! 2. a declaration in the `requirements.yml` beside the test playbook;
//! 3. a declaration in the role's own `meta/main.yml`.
//!
//! Precedence is a pure function over three explicit inputs, so the rules are
//! unit-testable without any filesystem. Transitive metadata dependencies are
//! expanded through the [`MetaSource`] seam until closure; a visited set makes
//! expansion terminate even on a cyclic dependency graph (first-seen source
//! wins, no error).

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::requirements::RoleRequirement;

/// Deduplicated mapping from role name to the winning source declaration,
/// in resolution order.
pub type ResolvedDependencySet = IndexMap<String, RoleRequirement>;

/// Provides the metadata-declared dependencies of an already-materialized
/// role. Implemented over the installed-roles directory in production and
/// over plain maps in tests.
pub trait MetaSource {
    /// Returns the dependencies the named role declares in its own metadata.
    /// Roles without readable metadata have no dependencies.
    fn dependencies_of(&self, name: &str) -> Result<Vec<RoleRequirement>>;
}

/// Resolver for one role-under-test, carrying the sibling context that
/// stays fixed across resolution rounds.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    sibling_requirements: Vec<RoleRequirement>,
    sibling_roles: BTreeSet<String>,
}

impl Resolver {
    /// Creates a resolver from the sibling-requirements declarations and the
    /// set of role names present as sibling directories.
    pub fn new(
        sibling_requirements: Vec<RoleRequirement>,
        sibling_roles: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            sibling_requirements,
            sibling_roles: sibling_roles.into_iter().collect(),
        }
    }

    /// True when a role of this name exists as a sibling directory and must
    /// never be fetched.
    pub fn is_shadowed(&self, name: &str) -> bool {
        self.sibling_roles.contains(name)
    }

    /// Resolves the directly-declared dependencies: role-metadata entries
    /// merged with sibling-requirements entries under the precedence rules.
    /// Pure; no side effects.
    pub fn resolve(&self, own_dependencies: &[RoleRequirement]) -> ResolvedDependencySet {
        let mut resolved = ResolvedDependencySet::new();

        for dep in own_dependencies {
            if self.is_shadowed(&dep.name) {
                debug!(role = %dep.name, "sibling role shadows metadata dependency");
                continue;
            }
            // First declaration wins among duplicate metadata entries.
            resolved.entry(dep.name.clone()).or_insert_with(|| dep.clone());
        }

        for req in &self.sibling_requirements {
            if self.is_shadowed(&req.name) {
                debug!(role = %req.name, "sibling role shadows requirements declaration");
                continue;
            }
            // A sibling-requirements declaration replaces a metadata one of
            // the same name; IndexMap::insert keeps the original position so
            // declaration order stays the tie-break.
            resolved.insert(req.name.clone(), req.clone());
        }

        resolved
    }

    /// Merges further metadata-declared dependencies into an existing resolved
    /// set, applying the same precedence. Returns the names that were newly
    /// added (and therefore still need to be fetched and expanded).
    pub fn merge(
        &self,
        resolved: &mut ResolvedDependencySet,
        dependencies: &[RoleRequirement],
    ) -> Vec<String> {
        let mut added = Vec::new();

        for dep in dependencies {
            if self.is_shadowed(&dep.name) || resolved.contains_key(&dep.name) {
                continue;
            }
            // A sibling-requirements declaration outranks the transitive
            // metadata source for the same name.
            let winner = self
                .sibling_requirements
                .iter()
                .find(|req| req.name == dep.name)
                .unwrap_or(dep)
                .clone();
            resolved.insert(dep.name.clone(), winner);
            added.push(dep.name.clone());
        }

        added
    }

    /// Expands a resolved set to transitive closure through `meta`. Every
    /// role name is visited at most once, so cyclic metadata graphs
    /// terminate with the first-seen source winning.
    pub fn resolve_to_closure<M: MetaSource>(
        &self,
        own_dependencies: &[RoleRequirement],
        meta: &M,
    ) -> Result<ResolvedDependencySet> {
        let mut resolved = self.resolve(own_dependencies);
        let mut pending: Vec<String> = resolved.keys().cloned().collect();
        let mut visited = BTreeSet::new();

        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let dependencies = meta.dependencies_of(&name)?;
            pending.extend(self.merge(&mut resolved, &dependencies));
        }

        Ok(resolved)
    }
}
