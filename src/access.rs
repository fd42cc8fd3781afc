//! The access decision engine.
//!
//! A pure function of (principal, catalog object, rule answers, catalog
//! mode): it issues no writes, and its only observable side effects are the
//! two authorization error categories raised in challenge situations.

#[cfg(feature = "audit")]
use log::debug;

use crate::catalog::{CatalogObject, LayerGroup, Workspace};
use crate::context::SecurityContext;
use crate::error::{Error, Result};
use crate::principal::Principal;
use crate::rules::AccessMode;
use crate::secured::{Secured, SecuredLayerGroup, SecuredObject};
use std::sync::Arc;

/// Global policy for surfacing unauthorized access to catalog objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogMode {
    /// Unauthorized objects are silently omitted.
    Hide,
    /// Omitted from capabilities documents, challenged everywhere else.
    Mixed,
    /// Metadata stays visible; data access is challenged.
    Challenge,
}

/// The per-object wrapping decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperPolicy {
    /// Omit the object entirely.
    Hide,
    /// Expose metadata only; challenge on data access.
    Metadata,
    /// Read-only; write attempts are silently hidden.
    ReadOnlyHide,
    /// Read-only; write attempts are challenged.
    ReadOnlyChallenge,
    /// Full access, no wrapping needed.
    ReadWrite,
}

impl WrapperPolicy {
    /// Whether the object is shown at all.
    pub fn is_visible(self) -> bool {
        self != WrapperPolicy::Hide
    }

    /// Whether mutating calls are accepted.
    pub fn allows_write(self) -> bool {
        self == WrapperPolicy::ReadWrite
    }

    /// Whether the underlying data (not just metadata) may be read.
    pub fn allows_data_access(self) -> bool {
        !matches!(self, WrapperPolicy::Hide | WrapperPolicy::Metadata)
    }

    fn rank(self) -> u8 {
        match self {
            WrapperPolicy::Hide => 0,
            WrapperPolicy::Metadata => 1,
            WrapperPolicy::ReadOnlyHide => 2,
            WrapperPolicy::ReadOnlyChallenge => 3,
            WrapperPolicy::ReadWrite => 4,
        }
    }

    pub(crate) fn most_restrictive(a: Self, b: Self) -> Self {
        if a.rank() <= b.rank() {
            a
        } else {
            b
        }
    }
}

/// Decides, per catalog object, how the current principal may see it.
pub struct AccessDecisionEngine {
    context: Arc<SecurityContext>,
}

impl AccessDecisionEngine {
    /// Create an engine over the given context.
    pub fn new(context: Arc<SecurityContext>) -> Self {
        Self { context }
    }

    /// Derive the wrapper policy from the two rule answers.
    ///
    /// Read is evaluated strictly before write: a principal failing read is
    /// never granted write-only visibility. `is_capabilities_request`
    /// suppresses the challenge during capabilities generation, which must
    /// degrade to omission rather than error.
    pub fn derive_policy(
        &self,
        principal: &Principal,
        can_read: bool,
        can_write: bool,
        object_name: &str,
        is_capabilities_request: bool,
    ) -> Result<WrapperPolicy> {
        if !can_read {
            return match self.context.mode() {
                CatalogMode::Hide => Ok(WrapperPolicy::Hide),
                CatalogMode::Mixed => {
                    if is_capabilities_request {
                        Ok(WrapperPolicy::Hide)
                    } else {
                        Err(self.challenge_error(principal, object_name))
                    }
                }
                CatalogMode::Challenge => Ok(WrapperPolicy::Metadata),
            };
        }
        if !can_write {
            return Ok(match self.context.mode() {
                CatalogMode::Hide => WrapperPolicy::ReadOnlyHide,
                CatalogMode::Mixed | CatalogMode::Challenge => WrapperPolicy::ReadOnlyChallenge,
            });
        }
        Ok(WrapperPolicy::ReadWrite)
    }

    /// The challenge signal: insufficient authentication for a principal
    /// with no granted authority at all, access denied otherwise.
    fn challenge_error(&self, principal: &Principal, object_name: &str) -> Error {
        #[cfg(feature = "audit")]
        debug!(
            "challenging access to '{}' for principal '{}'",
            object_name,
            principal.name().unwrap_or("<anonymous>")
        );
        if principal.has_any_authority() {
            Error::AccessDenied(object_name.to_string())
        } else {
            Error::InsufficientAuthentication(object_name.to_string())
        }
    }

    /// The workspace an object's rules are evaluated against.
    ///
    /// Namespace visibility derives from the workspace sharing its name;
    /// when none resolves, a synthetic placeholder is built just for the
    /// check and never persisted.
    fn workspace_for(&self, object: &CatalogObject) -> Option<Workspace> {
        match object {
            CatalogObject::Namespace(ns) => Some(
                self.context
                    .workspaces()
                    .workspace(ns.name())
                    .unwrap_or_else(|| Workspace::new(ns.name())),
            ),
            other => other.workspace_name().map(Workspace::new),
        }
    }

    /// Compute the wrapper policy for one object.
    pub fn policy_for(
        &self,
        principal: &Principal,
        object: &CatalogObject,
        is_capabilities_request: bool,
    ) -> Result<WrapperPolicy> {
        let workspace = self.workspace_for(object);
        let workspace = workspace.as_ref().map(Workspace::name);
        let rules = self.context.rules();

        let can_read = rules.can_access(principal, workspace, AccessMode::Read);
        let can_write = can_read && rules.can_access(principal, workspace, AccessMode::Write);
        self.derive_policy(
            principal,
            can_read,
            can_write,
            object.name(),
            is_capabilities_request,
        )
    }

    /// Wrap one object according to its policy, or hide it.
    ///
    /// Objects under `ReadWrite`, and read-only policies on kinds that are
    /// read-only in nature anyway (coverage stores), come back unwrapped,
    /// carried under a `ReadWrite` wrap.
    pub fn secure(
        &self,
        principal: &Principal,
        object: &CatalogObject,
        is_capabilities_request: bool,
    ) -> Result<Option<SecuredObject>> {
        if let CatalogObject::LayerGroup(group) = object {
            return self.secure_layer_group(principal, group, is_capabilities_request);
        }

        let policy = self.policy_for(principal, object, is_capabilities_request)?;
        if !policy.is_visible() {
            return Ok(None);
        }

        let policy = match object {
            CatalogObject::Store(store)
                if store.kind().is_inherently_read_only() && policy.allows_data_access() =>
            {
                WrapperPolicy::ReadWrite
            }
            _ => policy,
        };
        Ok(Some(SecuredObject::wrap(object.clone(), policy)))
    }

    /// A layer group is hidden in full if any member layer is individually
    /// hidden; otherwise it is wrapped under the most restrictive policy
    /// among its own and its members'.
    fn secure_layer_group(
        &self,
        principal: &Principal,
        group: &LayerGroup,
        is_capabilities_request: bool,
    ) -> Result<Option<SecuredObject>> {
        let own = self.policy_for(
            principal,
            &CatalogObject::LayerGroup(group.clone()),
            is_capabilities_request,
        )?;
        if !own.is_visible() {
            return Ok(None);
        }

        let mut effective = own;
        let mut layers = Vec::with_capacity(group.layers().len());
        for layer in group.layers() {
            let policy = self.policy_for(
                principal,
                &CatalogObject::Layer(layer.clone()),
                is_capabilities_request,
            )?;
            if !policy.is_visible() {
                return Ok(None);
            }
            effective = WrapperPolicy::most_restrictive(effective, policy);
            layers.push(Secured::new(layer.clone(), policy));
        }

        Ok(Some(SecuredObject::LayerGroup(SecuredLayerGroup::new(
            group.clone(),
            effective,
            layers,
        ))))
    }

    /// Filter a collection: retain survivors in their original relative
    /// order, wrapped as needed. The input is never mutated.
    pub fn filter(
        &self,
        principal: &Principal,
        objects: &[CatalogObject],
        is_capabilities_request: bool,
    ) -> Result<Vec<SecuredObject>> {
        let mut out = Vec::with_capacity(objects.len());
        for object in objects {
            if let Some(secured) = self.secure(principal, object, is_capabilities_request)? {
                out.push(secured);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, RoleMaps, UserGroupMaps};
    use crate::catalog::StaticWorkspaces;
    use crate::role::Role;
    use crate::role_service::RoleService;
    use crate::rules::{WorkspaceRule, WorkspaceRuleSet};
    use crate::user_group_service::UserGroupService;

    fn engine(mode: CatalogMode) -> AccessDecisionEngine {
        let roles = RoleService::new("roles", MemoryBackend::<RoleMaps>::new()).unwrap();
        let ug = UserGroupService::new("users", MemoryBackend::<UserGroupMaps>::new()).unwrap();
        let context = SecurityContext::new(
            roles,
            ug,
            Arc::new(WorkspaceRuleSet::new()),
            Arc::new(StaticWorkspaces::new()),
            mode,
        );
        AccessDecisionEngine::new(Arc::new(context))
    }

    fn authenticated() -> Principal {
        Principal::named("alice").with_authority(Role::new("ROLE_READER"))
    }

    #[test]
    fn test_policy_table_hide_mode() {
        let engine = engine(CatalogMode::Hide);
        let p = authenticated();

        for caps in [false, true] {
            assert_eq!(
                engine.derive_policy(&p, false, false, "obj", caps).unwrap(),
                WrapperPolicy::Hide
            );
            assert_eq!(
                engine.derive_policy(&p, true, false, "obj", caps).unwrap(),
                WrapperPolicy::ReadOnlyHide
            );
            assert_eq!(
                engine.derive_policy(&p, true, true, "obj", caps).unwrap(),
                WrapperPolicy::ReadWrite
            );
        }
    }

    #[test]
    fn test_policy_table_mixed_mode() {
        let engine = engine(CatalogMode::Mixed);
        let p = authenticated();

        // Capabilities requests degrade to omission.
        assert_eq!(
            engine.derive_policy(&p, false, false, "obj", true).unwrap(),
            WrapperPolicy::Hide
        );
        // Everything else challenges the caller.
        let err = engine.derive_policy(&p, false, false, "obj", false).unwrap_err();
        assert!(matches!(err, Error::AccessDenied(name) if name == "obj"));

        assert_eq!(
            engine.derive_policy(&p, true, false, "obj", false).unwrap(),
            WrapperPolicy::ReadOnlyChallenge
        );
        assert_eq!(
            engine.derive_policy(&p, true, true, "obj", false).unwrap(),
            WrapperPolicy::ReadWrite
        );
    }

    #[test]
    fn test_policy_table_challenge_mode() {
        let engine = engine(CatalogMode::Challenge);
        let p = authenticated();

        for caps in [false, true] {
            assert_eq!(
                engine.derive_policy(&p, false, false, "obj", caps).unwrap(),
                WrapperPolicy::Metadata
            );
            assert_eq!(
                engine.derive_policy(&p, true, false, "obj", caps).unwrap(),
                WrapperPolicy::ReadOnlyChallenge
            );
            assert_eq!(
                engine.derive_policy(&p, true, true, "obj", caps).unwrap(),
                WrapperPolicy::ReadWrite
            );
        }
    }

    #[test]
    fn test_read_failure_never_grants_write_visibility() {
        let engine = engine(CatalogMode::Hide);
        let p = authenticated();
        // can_write true is irrelevant once read fails.
        assert_eq!(
            engine.derive_policy(&p, false, true, "obj", false).unwrap(),
            WrapperPolicy::Hide
        );
    }

    #[test]
    fn test_challenge_error_depends_on_granted_authorities() {
        let engine = engine(CatalogMode::Mixed);

        let anon = Principal::anonymous();
        let err = engine.derive_policy(&anon, false, false, "obj", false).unwrap_err();
        assert!(matches!(err, Error::InsufficientAuthentication(_)));

        // A named principal without authorities still gets the
        // insufficient-authentication signal.
        let named = Principal::named("bob");
        let err = engine.derive_policy(&named, false, false, "obj", false).unwrap_err();
        assert!(matches!(err, Error::InsufficientAuthentication(_)));

        let err = engine
            .derive_policy(&authenticated(), false, false, "obj", false)
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied(_)));
    }

    #[test]
    fn test_policy_ranking() {
        assert_eq!(
            WrapperPolicy::most_restrictive(WrapperPolicy::ReadWrite, WrapperPolicy::Metadata),
            WrapperPolicy::Metadata
        );
        assert_eq!(
            WrapperPolicy::most_restrictive(
                WrapperPolicy::ReadOnlyChallenge,
                WrapperPolicy::ReadOnlyHide
            ),
            WrapperPolicy::ReadOnlyHide
        );
    }

    #[test]
    fn test_namespace_routes_through_synthetic_workspace() {
        let roles = RoleService::new("roles", MemoryBackend::<RoleMaps>::new()).unwrap();
        let ug = UserGroupService::new("users", MemoryBackend::<UserGroupMaps>::new()).unwrap();
        let rules = WorkspaceRuleSet::new();
        rules.set_rule("hidden_ws", WorkspaceRule::deny_all());

        // The workspace registry does not know "hidden_ws"; the rule check
        // still runs against the synthetic placeholder.
        let context = SecurityContext::new(
            roles,
            ug,
            Arc::new(rules),
            Arc::new(StaticWorkspaces::new()),
            CatalogMode::Hide,
        );
        let engine = AccessDecisionEngine::new(Arc::new(context));

        let ns = CatalogObject::Namespace(crate::catalog::Namespace::new(
            "hidden_ws",
            "http://example.org/hidden",
        ));
        let policy = engine.policy_for(&authenticated(), &ns, false).unwrap();
        assert_eq!(policy, WrapperPolicy::Hide);
    }
}
