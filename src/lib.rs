//! In-memory, eventually-consistent scheduler cache.
//!
//! Tracks cluster state (pods, nodes, pod disruption budgets) the way a
//! workload scheduler's hot path needs it: assumed-but-unconfirmed pods are
//! reflected immediately so concurrent scheduling decisions don't double-book
//! a node, and a background sweeper reclaims assumptions that never got
//! confirmed within their binding deadline.
//!
//! The cache never talks to the cluster authority directly — callers feed it
//! `AddPod`/`AddNode`/... as they observe those objects, and read it back via
//! `List`/`UpdateNodeNameToInfoMap` from the scheduling loop.

pub mod cache;
pub mod config;
pub mod error;
pub mod expirer;
pub mod node;
pub mod node_info;
pub mod pdb;
pub mod pod;
pub mod resources;
pub mod selector;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use node::Node;
pub use node_info::NodeInfo;
pub use pdb::{PdbStore, PodDisruptionBudget};
pub use pod::Pod;
pub use selector::{Everything, LabelEquality, Selector};
