//! Read-only user/group service facade.

#[cfg(feature = "audit")]
use log::info;

use crate::backend::{SecurityBackend, UserGroupMaps};
use crate::error::Result;
use crate::event::{self, LoadedListener, ReloadEvent};
use crate::user_group::{Group, User};
use crate::user_group_store::UserGroupStore;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

/// Read-only, always-fresh view over one user/group backend.
///
/// Cheap to clone; clones share the same live maps, listeners and commit
/// lock.
#[derive(Clone)]
pub struct UserGroupService {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    backend: Box<dyn SecurityBackend<UserGroupMaps>>,
    maps: RwLock<Arc<UserGroupMaps>>,
    listeners: Mutex<Vec<Box<dyn LoadedListener>>>,
    commit_lock: Mutex<()>,
}

impl UserGroupService {
    /// Create a service over the given backend and perform the initial load.
    ///
    /// A failed initial load is fatal: the service does not come up.
    pub fn new(
        name: impl Into<String>,
        backend: impl SecurityBackend<UserGroupMaps> + 'static,
    ) -> Result<Self> {
        let service = Self {
            inner: Arc::new(Inner {
                name: name.into(),
                backend: Box::new(backend),
                maps: RwLock::new(Arc::new(UserGroupMaps::default())),
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
        info!("user/group service '{}' reloaded", self.inner.name);

        let listeners = self.inner.listeners.lock().unwrap();
        event::dispatch(&listeners, &ReloadEvent::new(&self.inner.name));
        Ok(())
    }

    pub(crate) fn commit(&self, maps: &UserGroupMaps) -> Result<()> {
        let _guard = self.inner.commit_lock.lock().unwrap();
        self.inner.backend.write(maps)?;
        self.load_locked()
    }

    /// Register a listener invoked after every successful load, in
    /// registration order.
    pub fn register_listener(&self, listener: Box<dyn LoadedListener>) {
        self.inner.listeners.lock().unwrap().push(listener);
    }

    /// Create a mutable edit session over a deep copy of the current state,
    /// or `None` when the backend is read-only.
    pub fn create_store(&self) -> Option<UserGroupStore> {
        if self.inner.backend.writable() {
            Some(UserGroupStore::new(self.clone()))
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self) -> Arc<UserGroupMaps> {
        self.inner.maps.read().unwrap().clone()
    }

    /// Look up a user by username.
    pub fn user(&self, username: &str) -> Option<User> {
        self.snapshot().users.get(username).cloned()
    }

    /// All users, in natural order.
    pub fn users(&self) -> Vec<User> {
        self.snapshot().users.values().cloned().collect()
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<Group> {
        self.snapshot().groups.get(name).cloned()
    }

    /// All groups, in natural order.
    pub fn groups(&self) -> Vec<Group> {
        self.snapshot().groups.values().cloned().collect()
    }

    /// Groups the user is a direct member of, enabled or not.
    pub fn groups_of(&self, username: &str) -> BTreeSet<Group> {
        let maps = self.snapshot();
        maps.user_groups
            .get(username)
            .into_iter()
            .flatten()
            .filter_map(|name| maps.groups.get(name).cloned())
            .collect()
    }

    /// Direct members of a group.
    pub fn members_of(&self, group: &str) -> BTreeSet<User> {
        let maps = self.snapshot();
        maps.group_users
            .get(group)
            .into_iter()
            .flatten()
            .filter_map(|name| maps.users.get(name).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_membership_queries_are_direct_only() {
        let mut maps = UserGroupMaps::default();
        maps.users.insert("alice".into(), User::new("alice", "pw"));
        maps.groups.insert("editors".into(), Group::new("editors"));
        maps.group_users
            .entry("editors".into())
            .or_default()
            .insert("alice".into());

        let service = UserGroupService::new("default", MemoryBackend::with_state(maps)).unwrap();

        let groups = service.groups_of("alice");
        assert_eq!(groups.len(), 1);
        assert!(groups.contains(&Group::new("editors")));

        let members = service.members_of("editors");
        assert_eq!(members.len(), 1);
        assert!(members.contains(&User::new("alice", "pw")));
    }

    #[test]
    fn test_queries_return_owned_copies() {
        let service =
            UserGroupService::new("default", MemoryBackend::<UserGroupMaps>::new()).unwrap();
        assert!(service.users().is_empty());
        assert!(service.user("ghost").is_none());
    }
}
