//! Explicit security context wiring the core together.
//!
//! One context is constructed at process start and handed to the engine and
//! facades; there is no global singleton to look up.

use crate::access::CatalogMode;
use crate::calculator::RoleCalculator;
use crate::catalog::WorkspaceLookup;
use crate::principal::Principal;
use crate::role_service::RoleService;
use crate::rules::AccessRuleSet;
use crate::user_group_service::UserGroupService;
use std::sync::Arc;

/// The active services, rule evaluator and catalog mode for one installation.
pub struct SecurityContext {
    role_service: RoleService,
    user_group_service: UserGroupService,
    rules: Arc<dyn AccessRuleSet>,
    workspaces: Arc<dyn WorkspaceLookup>,
    mode: CatalogMode,
}

impl SecurityContext {
    /// Assemble a context from its collaborators.
    pub fn new(
        role_service: RoleService,
        user_group_service: UserGroupService,
        rules: Arc<dyn AccessRuleSet>,
        workspaces: Arc<dyn WorkspaceLookup>,
        mode: CatalogMode,
    ) -> Self {
        Self {
            role_service,
            user_group_service,
            rules,
            workspaces,
            mode,
        }
    }

    /// The active role service.
    pub fn role_service(&self) -> &RoleService {
        &self.role_service
    }

    /// The active user/group service.
    pub fn user_group_service(&self) -> &UserGroupService {
        &self.user_group_service
    }

    /// The rule evaluator.
    pub fn rules(&self) -> &dyn AccessRuleSet {
        self.rules.as_ref()
    }

    /// The workspace resolver.
    pub fn workspaces(&self) -> &dyn WorkspaceLookup {
        self.workspaces.as_ref()
    }

    /// The global catalog mode.
    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    /// A calculator over the active services.
    pub fn calculator(&self) -> RoleCalculator<'_> {
        RoleCalculator::new(&self.role_service, &self.user_group_service)
    }

    /// Build the principal for an authenticated user, with the fully
    /// expanded authority set attached.
    pub fn principal_for(&self, username: &str) -> Principal {
        Principal::named(username).with_authorities(self.calculator().effective_roles_of(username))
    }
}
