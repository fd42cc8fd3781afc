//! # Catalog Security
//!
//! Access-control core for a geospatial catalog: a role/user-group backend
//! with transactional edit sessions, and a per-object access decision engine
//! that wraps or hides catalog objects according to the computed policy.
//!
//! ## Features
//!
//! - Hierarchical roles (single parent, cycle-checked) with property bags
//! - Per-user role personalization with documented non-equality semantics
//! - Store/commit/rollback edit sessions over role and user/group records
//! - Read-only service facades with atomic map swap-in and reload listeners
//! - Effective-role expansion combining hierarchy and enabled-group membership
//! - Wrapper-policy derivation (hide / metadata / read-only / read-write)
//!   under the three catalog modes
//! - Order-preserving collection filtering with per-kind secured wrappers
//! - Pluggable durable backends (in-memory, JSON file)
//!
//! ## Quick Start
//!
//! ```rust
//! use catalog_security::{
//!     AccessDecisionEngine, CatalogMode, CatalogObject, MemoryBackend, Principal, Role,
//!     RoleService, SecurityContext, StaticWorkspaces, UserGroupService, Workspace,
//!     WorkspaceRule, WorkspaceRuleSet, WrapperPolicy,
//! };
//! use std::sync::Arc;
//!
//! // The two identity services, here over in-memory backends.
//! let roles = RoleService::new("default", MemoryBackend::new())?;
//! let users = UserGroupService::new("default", MemoryBackend::new())?;
//!
//! // Administrative edits go through a store and become visible on commit.
//! let mut store = roles.create_store().expect("backend is writable");
//! store.add_role(Role::new("ROLE_EDITOR"))?;
//! store.associate_role_to_user("alice", "ROLE_EDITOR")?;
//! store.store()?;
//!
//! // Secure one workspace behind the editor role.
//! let rules = WorkspaceRuleSet::new();
//! rules.set_rule(
//!     "topp",
//!     WorkspaceRule::deny_all()
//!         .read_roles(["ROLE_EDITOR"])
//!         .write_roles(["ROLE_EDITOR"]),
//! );
//! let workspaces = StaticWorkspaces::new();
//! workspaces.add(Workspace::new("topp"));
//!
//! let context = Arc::new(SecurityContext::new(
//!     roles,
//!     users,
//!     Arc::new(rules),
//!     Arc::new(workspaces),
//!     CatalogMode::Hide,
//! ));
//! let engine = AccessDecisionEngine::new(context.clone());
//!
//! let alice = context.principal_for("alice");
//! let topp = CatalogObject::Workspace(Workspace::new("topp"));
//! assert_eq!(engine.policy_for(&alice, &topp, false)?, WrapperPolicy::ReadWrite);
//!
//! // Anonymous callers never see the workspace in hide mode.
//! assert!(engine.secure(&Principal::anonymous(), &topp, false)?.is_none());
//! # Ok::<(), catalog_security::Error>(())
//! ```
//!
//! ## Audit Logging
//!
//! With the `audit` feature enabled, commits, reloads and access denials are
//! logged through the standard logging facade:
//!
//! ```rust
//! # #[cfg(feature = "audit")]
//! catalog_security::init_audit_logger();
//! // Configure through RUST_LOG, e.g. RUST_LOG=info,catalog_security=debug
//! ```

#[cfg(feature = "audit")]
pub fn init_audit_logger() {
    env_logger::init();
}

pub mod access;
pub mod backend;
pub mod calculator;
pub mod catalog;
pub mod context;
pub mod error;
pub mod event;
pub mod hierarchy;
pub mod principal;
pub mod role;
pub mod role_service;
pub mod role_store;
pub mod rules;
pub mod secured;
pub mod user_group;
pub mod user_group_service;
pub mod user_group_store;


// Re-export main types for convenience
pub use crate::{
    access::{AccessDecisionEngine, CatalogMode, WrapperPolicy},
    backend::{MemoryBackend, RoleMaps, SecurityBackend, UserGroupMaps},
    calculator::RoleCalculator,
    catalog::{
        CatalogObject, DataStore, Layer, LayerGroup, Namespace, Resource, StaticWorkspaces,
        StoreKind, Workspace, WorkspaceLookup,
    },
    context::SecurityContext,
    error::{Error, Result},
    event::{LoadedListener, ReloadEvent},
    principal::Principal,
    role::Role,
    role_service::{personalize_role_params, RoleService},
    role_store::RoleStore,
    rules::{AccessMode, AccessRuleSet, WorkspaceRule, WorkspaceRuleSet},
    secured::{Secured, SecuredLayerGroup, SecuredObject},
    user_group::{Group, User},
    user_group_service::UserGroupService,
    user_group_store::UserGroupStore,
};

#[cfg(feature = "persistence")]
pub use crate::backend::JsonFileBackend;
