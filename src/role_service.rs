//! Read-only role service facade.
//!
//! The service is the single source of truth consulted at request time. Its
//! maps are an immutable bundle behind an `Arc`, replaced wholesale on
//! `load()`; readers holding the previous bundle keep a consistent snapshot.

#[cfg(feature = "audit")]
use log::info;

use crate::backend::{RoleMaps, SecurityBackend};
use crate::error::Result;
use crate::event::{self, LoadedListener, ReloadEvent};
use crate::role::Role;
use crate::role_store::RoleStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

/// Read-only, always-fresh view over one role backend.
///
/// Cheap to clone; clones share the same live maps, listeners and commit
/// lock.
#[derive(Clone)]
pub struct RoleService {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    backend: Box<dyn SecurityBackend<RoleMaps>>,
    maps: RwLock<Arc<RoleMaps>>,
    listeners: Mutex<Vec<Box<dyn LoadedListener>>>,
    // Serializes load() with commits from any store targeting this service.
    commit_lock: Mutex<()>,
}

impl RoleService {
    /// Create a service over the given backend and perform the initial load.
    ///
    /// A failed initial load is fatal: the service does not come up.
    pub fn new(
        name: impl Into<String>,
        backend: impl SecurityBackend<RoleMaps> + 'static,
    ) -> Result<Self> {
        let service = Self {
            inner: Arc::new(Inner {
                name: name.into(),
                backend: Box::new(backend),
                maps: RwLock::new(Arc::new(RoleMaps::default())),
                listeners: Mutex::new(Vec::new()),
                commit_lock: Mutex::new(()),
            }),
        };
        service.load()?;
        Ok(service)
    }

    /// The service name, used in reload events and diagnostics.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Re-derive the live maps from the durable backend and swap them in.
    ///
    /// On a read failure the previous maps stay untouched; the service is
    /// stale but available.
    pub fn load(&self) -> Result<()> {
        let _guard = self.inner.commit_lock.lock().unwrap();
        self.load_locked()
    }

    fn load_locked(&self) -> Result<()> {
        let mut maps = self.inner.backend.read()?;
        maps.rebuild_indexes();
        *self.inner.maps.write().unwrap() = Arc::new(maps);

        #[cfg(feature = "audit")]
        info!("role service '{}' reloaded", self.inner.name);

        self.notify_loaded();
        Ok(())
    }

    /// Durably replace the backend state and reload, as one commit.
    pub(crate) fn commit(&self, maps: &RoleMaps) -> Result<()> {
        let _guard = self.inner.commit_lock.lock().unwrap();
        self.inner.backend.write(maps)?;
        self.load_locked()
    }

    fn notify_loaded(&self) {
        let listeners = self.inner.listeners.lock().unwrap();
        event::dispatch(&listeners, &ReloadEvent::new(&self.inner.name));
    }

    /// Register a listener invoked after every successful load, in
    /// registration order.
    pub fn register_listener(&self, listener: Box<dyn LoadedListener>) {
        self.inner.listeners.lock().unwrap().push(listener);
    }

    /// Create a mutable edit session over a deep copy of the current state,
    /// or `None` when the backend is read-only.
    pub fn create_store(&self) -> Option<RoleStore> {
        if self.inner.backend.writable() {
            Some(RoleStore::new(self.clone()))
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self) -> Arc<RoleMaps> {
        self.inner.maps.read().unwrap().clone()
    }

    /// Look up a role by authority name.
    pub fn role(&self, authority: &str) -> Option<Role> {
        self.snapshot().roles.get(authority).cloned()
    }

    /// All roles, in natural order.
    pub fn roles(&self) -> Vec<Role> {
        self.snapshot().roles.values().cloned().collect()
    }

    /// The parent of a role, if it has one.
    pub fn parent_role(&self, authority: &str) -> Option<Role> {
        let maps = self.snapshot();
        let parent = maps.parents.get(authority)?;
        maps.roles.get(parent).cloned()
    }

    /// The current role-to-parent mapping.
    pub fn parent_mappings(&self) -> BTreeMap<String, String> {
        self.snapshot().parents.clone()
    }

    /// Roles directly assigned to a user. Does **not** walk the hierarchy or
    /// group memberships; use [`RoleCalculator`](crate::calculator::RoleCalculator)
    /// for the effective set.
    pub fn direct_roles_of(&self, username: &str) -> BTreeSet<Role> {
        let maps = self.snapshot();
        maps.user_roles
            .get(username)
            .into_iter()
            .flatten()
            .filter_map(|name| maps.roles.get(name).cloned())
            .collect()
    }

    /// Roles directly assigned to a group. Does **not** walk the hierarchy.
    pub fn direct_roles_of_group(&self, group: &str) -> BTreeSet<Role> {
        let maps = self.snapshot();
        maps.group_roles
            .get(group)
            .into_iter()
            .flatten()
            .filter_map(|name| maps.roles.get(name).cloned())
            .collect()
    }

    /// Usernames directly holding the given role.
    pub fn users_with_role(&self, authority: &str) -> BTreeSet<String> {
        self.snapshot()
            .role_users
            .get(authority)
            .cloned()
            .unwrap_or_default()
    }

    /// Group names directly holding the given role.
    pub fn groups_with_role(&self, authority: &str) -> BTreeSet<String> {
        self.snapshot()
            .role_groups
            .get(authority)
            .cloned()
            .unwrap_or_default()
    }
}

/// Merge a role's property bag with a user's property overrides.
///
/// For each key the role defines, a same-named user property wins. Returns
/// `None` when no key was actually overridden, signalling that the canonical
/// role can be used as-is. Identical for every backend.
pub fn personalize_role_params(
    role_params: &BTreeMap<String, String>,
    user_props: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, String>> {
    let mut merged = role_params.clone();
    let mut overridden = false;
    for key in role_params.keys() {
        if let Some(value) = user_props.get(key) {
            merged.insert(key.clone(), value.clone());
            overridden = true;
        }
    }
    overridden.then_some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn seeded_service() -> RoleService {
        let mut maps = RoleMaps::default();
        maps.roles
            .insert("ROLE_READER".into(), Role::new("ROLE_READER"));
        maps.roles
            .insert("ROLE_WRITER".into(), Role::new("ROLE_WRITER"));
        maps.parents
            .insert("ROLE_WRITER".into(), "ROLE_READER".into());
        maps.user_roles
            .entry("alice".into())
            .or_default()
            .insert("ROLE_WRITER".into());
        RoleService::new("default", MemoryBackend::with_state(maps)).unwrap()
    }

    #[test]
    fn test_direct_roles_do_not_expand_hierarchy() {
        let service = seeded_service();
        let direct = service.direct_roles_of("alice");

        assert_eq!(direct.len(), 1);
        assert!(direct.contains(&Role::new("ROLE_WRITER")));
        // The parent is reachable only through parent_role.
        assert_eq!(
            service.parent_role("ROLE_WRITER").unwrap().authority(),
            "ROLE_READER"
        );
    }

    #[test]
    fn test_read_only_backend_refuses_store() {
        let backend = MemoryBackend::<RoleMaps>::new().read_only();
        let service = RoleService::new("ro", backend).unwrap();
        assert!(service.create_store().is_none());
    }

    #[test]
    fn test_personalize_overrides_role_keys() {
        let role_params =
            BTreeMap::from([("a".to_string(), String::new()), ("x".into(), "X".into())]);
        let user_props = BTreeMap::from([("a".to_string(), "A".to_string())]);

        let merged = personalize_role_params(&role_params, &user_props).unwrap();
        assert_eq!(merged.get("a").map(String::as_str), Some("A"));
        assert_eq!(merged.get("x").map(String::as_str), Some("X"));
    }

    #[test]
    fn test_personalize_none_when_nothing_overridden() {
        let role_params = BTreeMap::from([("x".to_string(), "X".to_string())]);
        assert!(personalize_role_params(&role_params, &BTreeMap::new()).is_none());

        // Keys only the user has never leak into the role.
        let user_props = BTreeMap::from([("y".to_string(), "Y".to_string())]);
        assert!(personalize_role_params(&role_params, &user_props).is_none());
    }
}
