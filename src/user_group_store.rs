//! Mutable edit session over a user/group backend.

#[cfg(feature = "audit")]
use log::info;

use crate::backend::UserGroupMaps;
use crate::error::{Error, Result};
use crate::user_group::{Group, User};
use crate::user_group_service::UserGroupService;
use std::collections::{BTreeMap, BTreeSet};

/// Edit buffer over user and group records, committed via
/// [`store`](UserGroupStore::store).
///
/// Not meant to be shared across threads; create one per administrative edit
/// session.
pub struct UserGroupStore {
    service: UserGroupService,
    maps: UserGroupMaps,
    dirty: bool,
}

impl UserGroupStore {
    pub(crate) fn new(service: UserGroupService) -> Self {
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

    fn require_user(&self, username: &str) -> Result<()> {
        if self.maps.users.contains_key(username) {
            Ok(())
        } else {
            Err(Error::UserNotFound(username.to_string()))
        }
    }

    fn require_group(&self, name: &str) -> Result<()> {
        if self.maps.groups.contains_key(name) {
            Ok(())
        } else {
            Err(Error::GroupNotFound(name.to_string()))
        }
    }

    fn drop_from_bucket(map: &mut BTreeMap<String, BTreeSet<String>>, key: &str, value: &str) {
        if let Some(bucket) = map.get_mut(key) {
            bucket.remove(value);
            if bucket.is_empty() {
                map.remove(key);
            }
        }
    }

    /// Add a new user. Fails if the username is taken.
    pub fn add_user(&mut self, user: User) -> Result<()> {
        if self.maps.users.contains_key(user.username()) {
            return Err(Error::UserAlreadyExists(user.username().to_string()));
        }
        self.maps.users.insert(user.username().to_string(), user);
        self.dirty = true;
        Ok(())
    }

    /// Replace an existing user wholesale. Fails if absent.
    pub fn update_user(&mut self, user: User) -> Result<()> {
        self.require_user(user.username())?;
        self.maps.users.insert(user.username().to_string(), user);
        self.dirty = true;
        Ok(())
    }

    /// Remove a user, cascading over group memberships. Returns `false` when
    /// the user was absent.
    pub fn remove_user(&mut self, username: &str) -> Result<bool> {
        if self.maps.users.remove(username).is_none() {
            return Ok(false);
        }
        if let Some(groups) = self.maps.user_groups.remove(username) {
            for group in groups {
                Self::drop_from_bucket(&mut self.maps.group_users, &group, username);
            }
        }
        self.dirty = true;
        Ok(true)
    }

    /// Add a new group. Fails if the name is taken.
    pub fn add_group(&mut self, group: Group) -> Result<()> {
        if self.maps.groups.contains_key(group.name()) {
            return Err(Error::GroupAlreadyExists(group.name().to_string()));
        }
        self.maps.groups.insert(group.name().to_string(), group);
        self.dirty = true;
        Ok(())
    }

    /// Replace an existing group wholesale. Fails if absent.
    pub fn update_group(&mut self, group: Group) -> Result<()> {
        self.require_group(group.name())?;
        self.maps.groups.insert(group.name().to_string(), group);
        self.dirty = true;
        Ok(())
    }

    /// Remove a group, cascading over memberships. Returns `false` when the
    /// group was absent.
    pub fn remove_group(&mut self, name: &str) -> Result<bool> {
        if self.maps.groups.remove(name).is_none() {
            return Ok(false);
        }
        if let Some(users) = self.maps.group_users.remove(name) {
            for user in users {
                Self::drop_from_bucket(&mut self.maps.user_groups, &user, name);
            }
        }
        self.dirty = true;
        Ok(true)
    }

    /// Put a user into a group. Both records must exist in this backend.
    pub fn associate_user_to_group(&mut self, username: &str, group: &str) -> Result<()> {
        self.require_user(username)?;
        self.require_group(group)?;
        self.maps
            .group_users
            .entry(group.to_string())
            .or_default()
            .insert(username.to_string());
        self.maps
            .user_groups
            .entry(username.to_string())
            .or_default()
            .insert(group.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Take a user out of a group, dropping emptied buckets.
    pub fn disassociate_user_from_group(&mut self, username: &str, group: &str) -> Result<()> {
        self.require_user(username)?;
        self.require_group(group)?;
        Self::drop_from_bucket(&mut self.maps.group_users, group, username);
        Self::drop_from_bucket(&mut self.maps.user_groups, username, group);
        self.dirty = true;
        Ok(())
    }

    /// Reset all maps to empty.
    pub fn clear(&mut self) {
        self.maps = UserGroupMaps::default();
        self.dirty = true;
    }

    /// Commit pending edits: durable write, then service reload, then clean.
    ///
    /// A clean store is a logged no-op.
    pub fn store(&mut self) -> Result<()> {
        if !self.dirty {
            #[cfg(feature = "audit")]
            info!(
                "user/group store for service '{}' has no pending edits, skipping commit",
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

    /// Look up a user in the pending (uncommitted) state.
    pub fn user(&self, username: &str) -> Option<&User> {
        self.maps.users.get(username)
    }

    /// Look up a group in the pending (uncommitted) state.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.maps.groups.get(name)
    }

    /// Pending group names for a user.
    pub fn group_names_of(&self, username: &str) -> BTreeSet<String> {
        self.maps
            .user_groups
            .get(username)
            .cloned()
            .unwrap_or_default()
    }
}
