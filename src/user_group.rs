//! User and group records managed by the user/group backend.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A user account known to one user/group backend.
///
/// Identity is the username, unique within the backend. The password is
/// opaque here: it arrives already encoded and the store never inspects it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    username: String,
    password: String,
    enabled: bool,
    properties: BTreeMap<String, String>,
}

impl User {
    /// Create an enabled user with an empty property bag.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            enabled: true,
            properties: BTreeMap::new(),
        }
    }

    /// Add a property to this user.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the pre-encoded password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether the account is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a property value by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.as_str())
    }

    /// Get the whole property bag.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

// Identity is the username alone; sets of users de-duplicate on it.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}

impl PartialOrd for User {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User {
    fn cmp(&self, other: &Self) -> Ordering {
        self.username.cmp(&other.username)
    }
}

/// A named group of users.
///
/// Identity is the group name, unique within the backend. Membership lives in
/// the backend's association maps, not on the record.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    name: String,
    enabled: bool,
}

impl Group {
    /// Create an enabled group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    /// Set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Get the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the group is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Group {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Group {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
