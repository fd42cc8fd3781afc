//! The authenticated (or anonymous) identity carried by a request.

use crate::role::Role;
use std::collections::BTreeSet;

/// The identity the access decision engine evaluates rules against.
///
/// Carries the fully expanded authority set, as produced by
/// [`RoleCalculator`](crate::calculator::RoleCalculator) at authentication
/// time. An anonymous principal has no name and no authorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: Option<String>,
    authorities: BTreeSet<Role>,
}

impl Principal {
    /// The anonymous principal.
    pub fn anonymous() -> Self {
        Self {
            name: None,
            authorities: BTreeSet::new(),
        }
    }

    /// A named principal with no authorities yet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            authorities: BTreeSet::new(),
        }
    }

    /// Attach a granted authority.
    pub fn with_authority(mut self, role: Role) -> Self {
        self.authorities.insert(role);
        self
    }

    /// Attach a set of granted authorities.
    pub fn with_authorities(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.authorities.extend(roles);
        self
    }

    /// The principal's name, if authenticated.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when no name is attached.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// The granted authority set.
    pub fn authorities(&self) -> &BTreeSet<Role> {
        &self.authorities
    }

    /// Whether the principal carries any granted authority at all. Decides
    /// between the insufficient-authentication and access-denied signals.
    pub fn has_any_authority(&self) -> bool {
        !self.authorities.is_empty()
    }

    /// Whether any granted authority (canonical or personalized) has the
    /// given name.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|r| r.authority() == authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_authority() {
        let p = Principal::anonymous();
        assert!(p.is_anonymous());
        assert!(!p.has_any_authority());
    }

    #[test]
    fn test_personalized_authority_matches_by_name() {
        let personalized = Role::new("ROLE_EDITOR").personalize("alice", Default::default());
        let p = Principal::named("alice").with_authority(personalized);
        assert!(p.has_authority("ROLE_EDITOR"));
        assert!(p.has_any_authority());
    }
}
