//! Pod Disruption Budget store: a keyed store of PDBs by `(namespace, name)`
//! with label-filtered listing. No cross-references with pods — consumers
//! filter by label selector at read time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::Selector;

pub type PdbKey = (String, String);

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdbMeta {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// The PDB's `spec` is opaque to the cache: it is stored and returned
/// verbatim but never interpreted.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodDisruptionBudget {
    pub metadata: PdbMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
}

impl PodDisruptionBudget {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: PdbMeta {
                namespace: namespace.into(),
                name: name.into(),
                labels: BTreeMap::new(),
            },
            spec: serde_json::Value::Null,
        }
    }

    pub fn key(&self) -> PdbKey {
        (self.metadata.namespace.clone(), self.metadata.name.clone())
    }
}

#[derive(Debug, Default)]
pub struct PdbStore {
    pdbs: BTreeMap<PdbKey, PodDisruptionBudget>,
}

impl PdbStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the PDB keyed by `(namespace, name)`.
    pub fn add(&mut self, pdb: PodDisruptionBudget) {
        self.pdbs.insert(pdb.key(), pdb);
    }

    /// Idempotent replacement under `(namespace, name)`. `old` is accepted
    /// for symmetry with the pod/node update operations but the store is
    /// keyed by identity alone, so only `new` is consulted.
    pub fn update(&mut self, _old: &PodDisruptionBudget, new: PodDisruptionBudget) {
        self.pdbs.insert(new.key(), new);
    }

    /// No-op if the key is absent; see DESIGN.md for the rationale.
    pub fn remove(&mut self, namespace: &str, name: &str) {
        self.pdbs.remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&PodDisruptionBudget> {
        self.pdbs.get(&(namespace.to_string(), name.to_string()))
    }

    /// Returns clones of every PDB whose labels match `selector`.
    pub fn list(&self, selector: &dyn Selector) -> Vec<PodDisruptionBudget> {
        self.pdbs
            .values()
            .filter(|pdb| selector.matches(&pdb.metadata.labels))
            .cloned()
            .collect()
    }
}
