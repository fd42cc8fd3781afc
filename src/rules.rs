//! The rule evaluator boundary and a workspace-keyed in-memory rule table.
//!
//! Rule management itself lives outside this crate; the engine only needs a
//! yes/no answer per principal, workspace and access mode.

use crate::principal::Principal;
use dashmap::DashMap;
use std::collections::BTreeSet;

/// The two capabilities evaluated per object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// External policy-rule evaluator consulted by the engine.
///
/// `workspace` is `None` for objects outside any workspace (global layer
/// groups); implementations then apply their catalog-wide default.
pub trait AccessRuleSet: Send + Sync {
    /// Whether the principal may access the workspace in the given mode.
    fn can_access(&self, principal: &Principal, workspace: Option<&str>, mode: AccessMode) -> bool;
}

/// One workspace's rule: the role names granted read and write.
///
/// The `*` entry matches any principal, including anonymous.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceRule {
    read: BTreeSet<String>,
    write: BTreeSet<String>,
}

impl WorkspaceRule {
    /// A rule granting read and write to everyone.
    pub fn allow_all() -> Self {
        Self {
            read: BTreeSet::from(["*".to_string()]),
            write: BTreeSet::from(["*".to_string()]),
        }
    }

    /// A rule granting nothing; grants are added with the builders below.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Grant read to the given role names.
    pub fn read_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.read = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Grant write to the given role names.
    pub fn write_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.write = roles.into_iter().map(Into::into).collect();
        self
    }

    fn grants(&self, principal: &Principal, mode: AccessMode) -> bool {
        let granted = match mode {
            AccessMode::Read => &self.read,
            AccessMode::Write => &self.write,
        };
        granted.contains("*")
            || principal
                .authorities()
                .iter()
                .any(|role| granted.contains(role.authority()))
    }
}

/// Workspace-keyed rule table with a catalog-wide default.
///
/// Backed by a `DashMap` so request threads evaluate rules without a global
/// lock while administrative edits land.
#[derive(Debug)]
pub struct WorkspaceRuleSet {
    rules: DashMap<String, WorkspaceRule>,
    default_rule: WorkspaceRule,
}

impl WorkspaceRuleSet {
    /// A table whose default grants everything, mirroring an unsecured
    /// catalog until rules are added.
    pub fn new() -> Self {
        Self::with_default(WorkspaceRule::allow_all())
    }

    /// A table with the given catalog-wide default rule.
    pub fn with_default(default_rule: WorkspaceRule) -> Self {
        Self {
            rules: DashMap::new(),
            default_rule,
        }
    }

    /// Set the rule for one workspace.
    pub fn set_rule(&self, workspace: impl Into<String>, rule: WorkspaceRule) {
        self.rules.insert(workspace.into(), rule);
    }

    /// Drop a workspace's rule, falling back to the default.
    pub fn remove_rule(&self, workspace: &str) {
        self.rules.remove(workspace);
    }
}

impl Default for WorkspaceRuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessRuleSet for WorkspaceRuleSet {
    fn can_access(&self, principal: &Principal, workspace: Option<&str>, mode: AccessMode) -> bool {
        match workspace.and_then(|ws| self.rules.get(ws)) {
            Some(rule) => rule.grants(principal, mode),
            None => self.default_rule.grants(principal, mode),
        }
    }
}
