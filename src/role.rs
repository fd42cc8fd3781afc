//! Role records: named authorities assignable to users and groups.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A role is a named permission grant, optionally carrying a property bag.
///
/// Identity is the authority name alone, case-sensitive. Two canonical roles
/// with the same authority name are equal regardless of their properties.
///
/// A role may also be *personalized*: bound to a specific user whose property
/// overrides have been merged in. A personalized instance is deliberately
/// **not** equal to the canonical role with the same authority name, so both
/// can coexist in a de-duplicating set. Personalized instances are transient
/// and are never persisted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    authority: String,
    properties: BTreeMap<String, String>,
    /// Set only on personalized instances; never round-trips to a backend.
    #[cfg_attr(feature = "persistence", serde(skip))]
    user_name: Option<String>,
}

impl Role {
    /// Create a canonical role with the given authority name.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            properties: BTreeMap::new(),
            user_name: None,
        }
    }

    /// Add a property to this role.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get the authority name.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Get a property value by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.as_str())
    }

    /// Get the whole property bag.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// The user this instance was personalized for, if any.
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// True for a transient instance bound to a specific user.
    pub fn is_personalized(&self) -> bool {
        self.user_name.is_some()
    }

    /// Build the personalized instance of this role for `user_name`, carrying
    /// the already-merged property bag.
    pub fn personalize(
        &self,
        user_name: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            authority: self.authority.clone(),
            properties,
            user_name: Some(user_name.into()),
        }
    }
}

// Identity is (authority, user_name); properties never take part. Keeping
// Eq/Ord/Hash on the same key tuple makes roles sound BTreeSet members.
impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.authority == other.authority && self.user_name == other.user_name
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.authority.hash(state);
        self.user_name.hash(state);
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.authority
            .cmp(&other.authority)
            .then_with(|| self.user_name.cmp(&other.user_name))
    }
}
