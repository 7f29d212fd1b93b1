//! Node type as observed from the cluster authority.
//!
//! `metadata`/`spec`/`status` nesting, trimmed to the fields the cache
//! actually reads: name, allocatable capacity, taints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceList;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub taints: Vec<Taint>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub allocatable: ResourceList,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub metadata: NodeMeta,
    #[serde(default)]
    pub spec: NodeSpec,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: NodeMeta {
                name: name.into(),
                labels: BTreeMap::new(),
            },
            spec: NodeSpec::default(),
            status: NodeStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
