//! Label selector capability.
//!
//! The cache depends only on the shape it needs from a selector, never on
//! a concrete scheduler or transport type. Callers pass anything
//! implementing `Selector`; `List`/`ListPDBs` never reflect over a
//! transport-specific selector type.

use std::collections::BTreeMap;

/// Predicate over a label map. External collaborators provide the concrete
/// selector implementation (e.g. a k8s `LabelSelector`); the cache only
/// ever calls `matches`.
pub trait Selector {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool;
}

/// Matches every set of labels. Useful for `List(Everything)`-style calls.
pub struct Everything;

impl Selector for Everything {
    fn matches(&self, _labels: &BTreeMap<String, String>) -> bool {
        true
    }
}

/// Exact-match selector over a fixed set of required key/value pairs.
#[derive(Debug, Default, Clone)]
pub struct LabelEquality {
    pub required: BTreeMap<String, String>,
}

impl Selector for LabelEquality {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.required
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_equality_requires_every_pair_to_match() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "web".to_string());
        labels.insert("tier".to_string(), "frontend".to_string());

        let mut required = BTreeMap::new();
        required.insert("app".to_string(), "web".to_string());
        let selector = LabelEquality { required };

        assert!(selector.matches(&labels));

        let mut wrong = BTreeMap::new();
        wrong.insert("app".to_string(), "worker".to_string());
        let selector = LabelEquality { required: wrong };
        assert!(!selector.matches(&labels));
    }

    #[test]
    fn everything_matches_empty_labels() {
        assert!(Everything.matches(&BTreeMap::new()));
    }
}
