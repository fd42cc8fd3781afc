//! Pure validation and traversal over the role parent hierarchy.
//!
//! The hierarchy is a `role -> parent` mapping forming a forest (at most one
//! parent per role). These helpers never mutate and never error; callers
//! re-derive the map from current record state before each call.

use std::collections::{BTreeMap, BTreeSet};

/// Check whether `candidate` may become the parent of `role` without
/// introducing a cycle.
///
/// Walks the existing parent chain upward from `candidate`; the assignment is
/// invalid if `role` appears anywhere on that chain (a self-parent is the
/// degenerate case). A `None` candidate detaches the role and is always
/// valid. The walk terminates on revisiting any node, so an already
/// inconsistent map cannot loop forever.
pub fn is_valid_parent(
    parents: &BTreeMap<String, String>,
    role: &str,
    candidate: Option<&str>,
) -> bool {
    let Some(candidate) = candidate else {
        return true;
    };

    let mut visited = BTreeSet::new();
    let mut current = Some(candidate);
    while let Some(name) = current {
        if name == role {
            return false;
        }
        if !visited.insert(name) {
            // Pre-existing cycle not involving `role`; the assignment itself
            // adds no new one.
            return true;
        }
        current = parents.get(name).map(|p| p.as_str());
    }
    true
}

/// Collect the ancestor chain of `role`, nearest parent first.
///
/// Stops on the first revisited node, tolerating an inconsistent map.
pub fn ancestors_of(parents: &BTreeMap<String, String>, role: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = BTreeSet::new();
    visited.insert(role.to_string());

    let mut current = parents.get(role);
    while let Some(parent) = current {
        if !visited.insert(parent.clone()) {
            break;
        }
        chain.push(parent.clone());
        current = parents.get(parent);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(c, p)| (c.to_string(), p.to_string()))
            .collect()
    }

    #[test]
    fn test_self_parent_rejected() {
        let parents = BTreeMap::new();
        assert!(!is_valid_parent(&parents, "ROLE_A", Some("ROLE_A")));
    }

    #[test]
    fn test_cycle_rejected() {
        // c -> b -> a; making c the parent of a would close the loop.
        let parents = map(&[("ROLE_B", "ROLE_A"), ("ROLE_C", "ROLE_B")]);
        assert!(!is_valid_parent(&parents, "ROLE_A", Some("ROLE_C")));
        assert!(!is_valid_parent(&parents, "ROLE_A", Some("ROLE_B")));
    }

    #[test]
    fn test_valid_assignments() {
        let parents = map(&[("ROLE_B", "ROLE_A")]);
        assert!(is_valid_parent(&parents, "ROLE_C", Some("ROLE_B")));
        assert!(is_valid_parent(&parents, "ROLE_B", Some("ROLE_C")));
        assert!(is_valid_parent(&parents, "ROLE_A", None));
    }

    #[test]
    fn test_inconsistent_map_terminates() {
        // x <-> y is already broken; assigning an unrelated role still
        // returns instead of spinning.
        let parents = map(&[("ROLE_X", "ROLE_Y"), ("ROLE_Y", "ROLE_X")]);
        assert!(is_valid_parent(&parents, "ROLE_Z", Some("ROLE_X")));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let parents = map(&[("ROLE_C", "ROLE_B"), ("ROLE_B", "ROLE_A")]);
        assert_eq!(ancestors_of(&parents, "ROLE_C"), vec!["ROLE_B", "ROLE_A"]);
        assert!(ancestors_of(&parents, "ROLE_A").is_empty());
    }
}
