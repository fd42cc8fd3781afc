//! Effective-role expansion.
//!
//! The service facades return only *direct* associations. This calculator is
//! the one place that expands the full authority set: direct roles, roles
//! inherited through the parent hierarchy, and roles obtained via enabled
//! group memberships, de-duplicated in a sorted set and personalized against
//! the user's property bag.

use crate::role::Role;
use crate::role_service::{personalize_role_params, RoleService};
use crate::user_group_service::UserGroupService;
use std::collections::BTreeSet;

/// Computes fully expanded role sets from the two service facades.
pub struct RoleCalculator<'a> {
    roles: &'a RoleService,
    user_groups: &'a UserGroupService,
}

impl<'a> RoleCalculator<'a> {
    /// Create a calculator over the given services.
    pub fn new(roles: &'a RoleService, user_groups: &'a UserGroupService) -> Self {
        Self { roles, user_groups }
    }

    /// The complete authority set of a user.
    ///
    /// Disabled groups contribute nothing. Roles whose properties get
    /// overridden by the user's own properties come back as personalized
    /// instances bound to the user.
    pub fn effective_roles_of(&self, username: &str) -> BTreeSet<Role> {
        let mut out = BTreeSet::new();

        for role in self.roles.direct_roles_of(username) {
            self.insert_with_ancestors(role, &mut out);
        }
        for group in self.user_groups.groups_of(username) {
            if !group.is_enabled() {
                continue;
            }
            for role in self.roles.direct_roles_of_group(group.name()) {
                self.insert_with_ancestors(role, &mut out);
            }
        }

        match self.user_groups.user(username) {
            Some(user) => out
                .into_iter()
                .map(|role| {
                    match personalize_role_params(role.properties(), user.properties()) {
                        Some(merged) => role.personalize(username, merged),
                        None => role,
                    }
                })
                .collect(),
            None => out,
        }
    }

    /// The complete authority set of a group: its direct roles plus all
    /// ancestors. No personalization applies at group level.
    pub fn effective_roles_of_group(&self, group: &str) -> BTreeSet<Role> {
        let mut out = BTreeSet::new();
        for role in self.roles.direct_roles_of_group(group) {
            self.insert_with_ancestors(role, &mut out);
        }
        out
    }

    fn insert_with_ancestors(&self, role: Role, out: &mut BTreeSet<Role>) {
        let mut current = role.authority().to_string();
        if !out.insert(role) {
            return;
        }
        // Visited tracking rides on the output set itself.
        while let Some(parent) = self.roles.parent_role(&current) {
            current = parent.authority().to_string();
            if !out.insert(parent) {
                break;
            }
        }
    }
}
