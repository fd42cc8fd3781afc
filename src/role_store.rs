//! Mutable edit session over a role backend.
//!
//! A store is a short-lived, single-threaded transaction object: it works on
//! a deep copy of its service's maps, tracks a dirty flag, and only touches
//! durable state on `store()`. `load()` discards pending edits.

#[cfg(feature = "audit")]
use log::info;

use crate::backend::RoleMaps;
use crate::error::{Error, Result};
use crate::hierarchy;
use crate::role::Role;
use crate::role_service::RoleService;
use std::collections::BTreeSet;

/// Edit buffer over role records, committed via [`store`](RoleStore::store).
///
/// Not meant to be shared across threads; create one per administrative edit
/// session.
pub struct RoleStore {
    service: RoleService,
    maps: RoleMaps,
    dirty: bool,
}

impl RoleStore {
    pub(crate) fn new(service: RoleService) -> Self {
        let maps = (*service.snapshot()).clone();
        Self {
            service,
            maps,
            dirty: false,
        }
    }

    /// True when this store holds uncommitted edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn require_role(&self, authority: &str) -> Result<()> {
        if self.maps.roles.contains_key(authority) {
            Ok(())
        } else {
            Err(Error::RoleNotFound(authority.to_string()))
        }
    }

    fn validate(role: &Role) -> Result<()> {
        if role.authority().is_empty() {
            return Err(Error::EmptyAuthorityName);
        }
        if role.is_personalized() {
            return Err(Error::TransientRole(role.authority().to_string()));
        }
        Ok(())
    }

    /// Add a new role. Fails if a role with the same authority exists.
    pub fn add_role(&mut self, role: Role) -> Result<()> {
        Self::validate(&role)?;
        if self.maps.roles.contains_key(role.authority()) {
            return Err(Error::RoleAlreadyExists(role.authority().to_string()));
        }
        self.maps.roles.insert(role.authority().to_string(), role);
        self.dirty = true;
        Ok(())
    }

    /// Replace an existing role wholesale. Fails if absent.
    pub fn update_role(&mut self, role: Role) -> Result<()> {
        Self::validate(&role)?;
        self.require_role(role.authority())?;
        self.maps.roles.insert(role.authority().to_string(), role);
        self.dirty = true;
        Ok(())
    }

    /// Remove a role, cascading over associations and the hierarchy.
    ///
    /// Child roles are detached (parent set to none), not deleted. Returns
    /// `false` when the role was absent.
    pub fn remove_role(&mut self, authority: &str) -> Result<bool> {
        if self.maps.roles.remove(authority).is_none() {
            return Ok(false);
        }

        self.maps.parents.remove(authority);
        let children: Vec<String> = self
            .maps
            .parents
            .iter()
            .filter(|(_, parent)| parent.as_str() == authority)
            .map(|(child, _)| child.clone())
            .collect();
        for child in children {
            self.maps.parents.remove(&child);
        }

        if let Some(users) = self.maps.role_users.remove(authority) {
            for user in users {
                Self::drop_from_bucket(&mut self.maps.user_roles, &user, authority);
            }
        }
        if let Some(groups) = self.maps.role_groups.remove(authority) {
            for group in groups {
                Self::drop_from_bucket(&mut self.maps.group_roles, &group, authority);
            }
        }

        self.dirty = true;
        Ok(true)
    }

    fn drop_from_bucket(
        map: &mut std::collections::BTreeMap<String, BTreeSet<String>>,
        key: &str,
        value: &str,
    ) {
        if let Some(bucket) = map.get_mut(key) {
            bucket.remove(value);
            if bucket.is_empty() {
                map.remove(key);
            }
        }
    }

    /// Associate a role to a user by name. The role must exist; the username
    /// is a foreign identifier not checked here.
    pub fn associate_role_to_user(&mut self, username: &str, authority: &str) -> Result<()> {
        self.require_role(authority)?;
        self.maps
            .user_roles
            .entry(username.to_string())
            .or_default()
            .insert(authority.to_string());
        self.maps
            .role_users
            .entry(authority.to_string())
            .or_default()
            .insert(username.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Remove a role-to-user association, dropping emptied buckets.
    pub fn disassociate_role_from_user(&mut self, username: &str, authority: &str) -> Result<()> {
        self.require_role(authority)?;
        Self::drop_from_bucket(&mut self.maps.user_roles, username, authority);
        Self::drop_from_bucket(&mut self.maps.role_users, authority, username);
        self.dirty = true;
        Ok(())
    }

    /// Associate a role to a group by name. The role must exist.
    pub fn associate_role_to_group(&mut self, group: &str, authority: &str) -> Result<()> {
        self.require_role(authority)?;
        self.maps
            .group_roles
            .entry(group.to_string())
            .or_default()
            .insert(authority.to_string());
        self.maps
            .role_groups
            .entry(authority.to_string())
            .or_default()
            .insert(group.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Remove a role-to-group association, dropping emptied buckets.
    pub fn disassociate_role_from_group(&mut self, group: &str, authority: &str) -> Result<()> {
        self.require_role(authority)?;
        Self::drop_from_bucket(&mut self.maps.group_roles, group, authority);
        Self::drop_from_bucket(&mut self.maps.role_groups, authority, group);
        self.dirty = true;
        Ok(())
    }

    /// Set or clear a role's parent.
    ///
    /// Validated against the current hierarchy before any mutation; on
    /// failure the hierarchy map is untouched.
    pub fn set_parent_role(&mut self, authority: &str, parent: Option<&str>) -> Result<()> {
        self.require_role(authority)?;
        if let Some(parent) = parent {
            self.require_role(parent)?;
        }
        if !hierarchy::is_valid_parent(&self.maps.parents, authority, parent) {
            return Err(Error::InvalidParent {
                role: authority.to_string(),
                parent: parent.unwrap_or_default().to_string(),
            });
        }
        match parent {
            Some(parent) => {
                self.maps
                    .parents
                    .insert(authority.to_string(), parent.to_string());
            }
            None => {
                self.maps.parents.remove(authority);
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Reset all maps to empty.
    pub fn clear(&mut self) {
        self.maps = RoleMaps::default();
        self.dirty = true;
    }

    /// Commit pending edits: durable write, then service reload, then clean.
    ///
    /// A clean store is a logged no-op. Once this returns, any new read
    /// through the service observes the committed state.
    pub fn store(&mut self) -> Result<()> {
        if !self.dirty {
            #[cfg(feature = "audit")]
            info!(
                "role store for service '{}' has no pending edits, skipping commit",
                self.service.name()
            );
            return Ok(());
        }
        self.service.commit(&self.maps)?;
        self.dirty = false;
        Ok(())
    }

    /// Discard pending edits, re-copying the service's current state.
    pub fn load(&mut self) {
        self.maps = (*self.service.snapshot()).clone();
        self.dirty = false;
    }

    /// Look up a role in the pending (uncommitted) state.
    pub fn role(&self, authority: &str) -> Option<&Role> {
        self.maps.roles.get(authority)
    }

    /// The pending parent of a role.
    pub fn parent_of(&self, authority: &str) -> Option<&str> {
        self.maps.parents.get(authority).map(String::as_str)
    }

    /// Role names pending for a user.
    pub fn role_names_of(&self, username: &str) -> BTreeSet<String> {
        self.maps
            .user_roles
            .get(username)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn fresh_store() -> RoleStore {
        let service = RoleService::new("default", MemoryBackend::<RoleMaps>::new()).unwrap();
        service.create_store().unwrap()
    }

    #[test]
    fn test_add_then_commit_then_visible() {
        let service = RoleService::new("default", MemoryBackend::<RoleMaps>::new()).unwrap();
        let mut store = service.create_store().unwrap();

        store.add_role(Role::new("ROLE_READER")).unwrap();
        assert!(store.is_dirty());
        assert!(service.role("ROLE_READER").is_none());

        store.store().unwrap();
        assert!(!store.is_dirty());
        assert!(service.role("ROLE_READER").is_some());
    }

    #[test]
    fn test_load_discards_pending_edits() {
        let service = RoleService::new("default", MemoryBackend::<RoleMaps>::new()).unwrap();
        let mut store = service.create_store().unwrap();

        store.add_role(Role::new("ROLE_READER")).unwrap();
        store.load();

        assert!(!store.is_dirty());
        assert!(store.role("ROLE_READER").is_none());
        assert!(service.role("ROLE_READER").is_none());
    }

    #[test]
    fn test_duplicate_add_fails() {
        let mut store = fresh_store();
        store.add_role(Role::new("ROLE_READER")).unwrap();
        let err = store.add_role(Role::new("ROLE_READER")).unwrap_err();
        assert!(matches!(err, Error::RoleAlreadyExists(name) if name == "ROLE_READER"));
    }

    #[test]
    fn test_update_missing_fails() {
        let mut store = fresh_store();
        let err = store.update_role(Role::new("ROLE_GHOST")).unwrap_err();
        assert!(matches!(err, Error::RoleNotFound(name) if name == "ROLE_GHOST"));
    }

    #[test]
    fn test_update_replaces_wholesale() {
        let mut store = fresh_store();
        store
            .add_role(Role::new("ROLE_READER").with_property("a", "1"))
            .unwrap();
        store
            .update_role(Role::new("ROLE_READER").with_property("b", "2"))
            .unwrap();

        let role = store.role("ROLE_READER").unwrap();
        assert_eq!(role.property("a"), None);
        assert_eq!(role.property("b"), Some("2"));
    }

    #[test]
    fn test_personalized_role_rejected() {
        let mut store = fresh_store();
        let personalized = Role::new("ROLE_READER").personalize("alice", Default::default());
        let err = store.add_role(personalized).unwrap_err();
        assert!(matches!(err, Error::TransientRole(_)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = fresh_store();
        store.add_role(Role::new("ROLE_READER")).unwrap();
        assert!(store.remove_role("ROLE_READER").unwrap());
        assert!(!store.remove_role("ROLE_READER").unwrap());
    }

    #[test]
    fn test_remove_cascades_and_detaches_children() {
        let mut store = fresh_store();
        store.add_role(Role::new("ROLE_BASE")).unwrap();
        store.add_role(Role::new("ROLE_CHILD")).unwrap();
        store.set_parent_role("ROLE_CHILD", Some("ROLE_BASE")).unwrap();
        store.associate_role_to_user("alice", "ROLE_BASE").unwrap();
        store.associate_role_to_group("editors", "ROLE_BASE").unwrap();

        assert!(store.remove_role("ROLE_BASE").unwrap());

        // Child survives, detached.
        assert!(store.role("ROLE_CHILD").is_some());
        assert!(store.parent_of("ROLE_CHILD").is_none());
        // Associations are gone, including the emptied buckets.
        assert!(store.role_names_of("alice").is_empty());
        assert!(!store.maps.user_roles.contains_key("alice"));
        assert!(!store.maps.group_roles.contains_key("editors"));
    }

    #[test]
    fn test_cycle_rejected_without_mutation() {
        let mut store = fresh_store();
        store.add_role(Role::new("ROLE_A")).unwrap();
        store.add_role(Role::new("ROLE_B")).unwrap();
        store.set_parent_role("ROLE_B", Some("ROLE_A")).unwrap();

        let err = store.set_parent_role("ROLE_A", Some("ROLE_B")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParent { ref role, ref parent }
                if role == "ROLE_A" && parent == "ROLE_B"
        ));
        // Hierarchy unchanged on failure.
        assert_eq!(store.parent_of("ROLE_B"), Some("ROLE_A"));
        assert!(store.parent_of("ROLE_A").is_none());
    }

    #[test]
    fn test_disassociate_drops_empty_bucket() {
        let mut store = fresh_store();
        store.add_role(Role::new("ROLE_READER")).unwrap();
        store.associate_role_to_user("alice", "ROLE_READER").unwrap();
        store
            .disassociate_role_from_user("alice", "ROLE_READER")
            .unwrap();
        assert!(!store.maps.user_roles.contains_key("alice"));
        assert!(!store.maps.role_users.contains_key("ROLE_READER"));
    }

    #[test]
    fn test_clean_store_commit_is_noop() {
        let mut store = fresh_store();
        assert!(!store.is_dirty());
        store.store().unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_store_edits_do_not_leak_into_service_before_commit() {
        let service = RoleService::new("default", MemoryBackend::<RoleMaps>::new()).unwrap();
        let mut store = service.create_store().unwrap();
        store.add_role(Role::new("ROLE_READER")).unwrap();
        store.associate_role_to_user("alice", "ROLE_READER").unwrap();

        assert!(service.roles().is_empty());
        assert!(service.direct_roles_of("alice").is_empty());
    }
}
