//! Durable backends for role and user/group records.
//!
//! A backend reads and writes whole snapshots, never individual records; the
//! commit lock held by the owning service keeps reads and writes from
//! interleaving. Records are keyed by stable string identifiers only.

use crate::error::Result;
use crate::role::Role;
use crate::user_group::{Group, User};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// The full record state of one role backend.
///
/// The persisted form carries roles, the parent map and the forward
/// association maps; the reverse maps are indexes rebuilt after a read.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleMaps {
    /// Canonical roles keyed by authority name.
    pub roles: BTreeMap<String, Role>,
    /// Role name to parent role name; absent key means no parent.
    pub parents: BTreeMap<String, String>,
    /// Username to directly assigned role names.
    pub user_roles: BTreeMap<String, BTreeSet<String>>,
    /// Group name to directly assigned role names.
    pub group_roles: BTreeMap<String, BTreeSet<String>>,
    /// Reverse index of `user_roles`.
    #[cfg_attr(feature = "persistence", serde(skip))]
    pub role_users: BTreeMap<String, BTreeSet<String>>,
    /// Reverse index of `group_roles`.
    #[cfg_attr(feature = "persistence", serde(skip))]
    pub role_groups: BTreeMap<String, BTreeSet<String>>,
}

impl RoleMaps {
    /// Rebuild the reverse association indexes from the forward maps.
    pub fn rebuild_indexes(&mut self) {
        self.role_users.clear();
        self.role_groups.clear();
        for (user, roles) in &self.user_roles {
            for role in roles {
                self.role_users
                    .entry(role.clone())
                    .or_default()
                    .insert(user.clone());
            }
        }
        for (group, roles) in &self.group_roles {
            for role in roles {
                self.role_groups
                    .entry(role.clone())
                    .or_default()
                    .insert(group.clone());
            }
        }
    }
}

/// The full record state of one user/group backend.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct UserGroupMaps {
    /// Users keyed by username.
    pub users: BTreeMap<String, User>,
    /// Groups keyed by group name.
    pub groups: BTreeMap<String, Group>,
    /// Group name to member usernames; the persisted side of membership.
    pub group_users: BTreeMap<String, BTreeSet<String>>,
    /// Reverse index of `group_users`.
    #[cfg_attr(feature = "persistence", serde(skip))]
    pub user_groups: BTreeMap<String, BTreeSet<String>>,
}

impl UserGroupMaps {
    /// Rebuild the reverse membership index from the persisted side.
    pub fn rebuild_indexes(&mut self) {
        self.user_groups.clear();
        for (group, users) in &self.group_users {
            for user in users {
                self.user_groups
                    .entry(user.clone())
                    .or_default()
                    .insert(group.clone());
            }
        }
    }
}

/// Byte-oriented persistence for one backend's record snapshot.
///
/// Implementations must replace the stored snapshot atomically on `write` and
/// are only invoked while the owning service holds its commit lock.
pub trait SecurityBackend<S>: Send + Sync {
    /// Read the full current snapshot.
    fn read(&self) -> Result<S>;

    /// Durably replace the full snapshot.
    fn write(&self, snapshot: &S) -> Result<()>;

    /// Whether this backend accepts writes. Read-only backends make the
    /// owning service refuse to create stores.
    fn writable(&self) -> bool {
        true
    }
}

/// In-memory backend, the default for tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryBackend<S> {
    state: Mutex<S>,
    read_only: bool,
}

impl<S: Clone + Default> MemoryBackend<S> {
    /// Create an empty writable backend.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(S::default()),
            read_only: false,
        }
    }

    /// Create a backend pre-seeded with a snapshot.
    pub fn with_state(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            read_only: false,
        }
    }

    /// Mark this backend read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl<S: Clone + Send> SecurityBackend<S> for MemoryBackend<S> {
    fn read(&self) -> Result<S> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn write(&self, snapshot: &S) -> Result<()> {
        *self.state.lock().unwrap() = snapshot.clone();
        Ok(())
    }

    fn writable(&self) -> bool {
        !self.read_only
    }
}

/// File-based backend persisting snapshots as JSON.
#[cfg(feature = "persistence")]
pub mod file_backend {
    use super::*;
    use crate::error::Error;
    use serde::{de::DeserializeOwned, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::marker::PhantomData;
    use std::path::{Path, PathBuf};

    /// JSON file backend. Writes go to a sibling temp file first and are
    /// renamed into place, so readers only ever see a complete snapshot.
    #[derive(Debug)]
    pub struct JsonFileBackend<S> {
        path: PathBuf,
        _snapshot: PhantomData<fn() -> S>,
    }

    impl<S> JsonFileBackend<S> {
        /// Create a backend at the given path, creating parent directories.
        pub fn new(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref().to_path_buf();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(Error::Backend)?;
            }
            Ok(Self {
                path,
                _snapshot: PhantomData,
            })
        }

        /// The backing file path.
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl<S> SecurityBackend<S> for JsonFileBackend<S>
    where
        S: Serialize + DeserializeOwned + Default,
    {
        fn read(&self) -> Result<S> {
            if !self.path.exists() {
                return Ok(S::default());
            }
            let file = File::open(&self.path).map_err(Error::Backend)?;
            let snapshot = serde_json::from_reader(BufReader::new(file))?;
            Ok(snapshot)
        }

        fn write(&self, snapshot: &S) -> Result<()> {
            let tmp = self.path.with_extension("tmp");
            {
                let file = File::create(&tmp).map_err(Error::Backend)?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, snapshot)?;
                writer.flush().map_err(Error::Backend)?;
            }
            fs::rename(&tmp, &self.path).map_err(Error::Backend)?;
            Ok(())
        }
    }
}

#[cfg(feature = "persistence")]
pub use file_backend::JsonFileBackend;
