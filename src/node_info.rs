//! Per-node aggregate of pods, requested resources, taints, allocatable
//! capacity, used host ports, and a monotonic generation counter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::node::{Node, Taint};
use crate::pod::Pod;
use crate::resources::ResourceVector;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    node: Option<Node>,
    pods: Vec<Pod>,
    requested_resource: ResourceVector,
    nonzero_request: ResourceVector,
    allocatable_resource: ResourceVector,
    taints: Vec<Taint>,
    used_ports: BTreeSet<String>,
    generation: u64,
}

impl NodeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn requested_resource(&self) -> &ResourceVector {
        &self.requested_resource
    }

    pub fn nonzero_request(&self) -> &ResourceVector {
        &self.nonzero_request
    }

    pub fn allocatable_resource(&self) -> &ResourceVector {
        &self.allocatable_resource
    }

    pub fn taints(&self) -> &[Taint] {
        &self.taints
    }

    pub fn used_ports(&self) -> &BTreeSet<String> {
        &self.used_ports
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A NodeInfo should be dropped once neither a node nor any pods remain.
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.pods.is_empty()
    }

    /// Appends `pod`, folds its declared and non-zero-normalized requests
    /// into the running sums, and unions its host ports into `usedPorts`.
    /// Ports are unioned rather than replaced — overwriting on every add
    /// would silently drop earlier pods' ports from the set.
    pub fn add_pod(&mut self, pod: Pod, default_milli_cpu: i64, default_memory: i64) {
        self.requested_resource.add_assign(&pod.declared_requests());
        self.nonzero_request
            .add_assign(&pod.nonzero_requests(default_milli_cpu, default_memory));
        self.used_ports.extend(pod.used_ports());
        self.pods.push(pod);
        self.generation += 1;
    }

    /// Removes the pod identified by `uid`, preserving the relative order of
    /// the remaining pods, and recomputes `usedPorts` as the union of the
    /// remaining pods' declared ports.
    pub fn remove_pod(
        &mut self,
        uid: &str,
        default_milli_cpu: i64,
        default_memory: i64,
    ) -> Result<Pod> {
        let index = self
            .pods
            .iter()
            .position(|p| p.uid() == uid)
            .ok_or_else(|| CacheError::NotFound(uid.to_string()))?;
        let removed = self.pods.remove(index);

        self.requested_resource
            .sub_assign(&removed.declared_requests());
        self.nonzero_request
            .sub_assign(&removed.nonzero_requests(default_milli_cpu, default_memory));

        self.used_ports.clear();
        for pod in &self.pods {
            self.used_ports.extend(pod.used_ports());
        }

        self.generation += 1;
        Ok(removed)
    }

    /// Replaces the pod matching `uid` in place with `pod`, without touching
    /// the resource sums or port set — used by `AddPod`'s assumed→bound
    /// transition, where the authoritative pod must replace the assumed one
    /// without re-aggregating.
    pub fn replace_pod_in_place(&mut self, uid: &str, pod: Pod) -> Result<()> {
        let index = self
            .pods
            .iter()
            .position(|p| p.uid() == uid)
            .ok_or_else(|| CacheError::NotFound(uid.to_string()))?;
        self.pods[index] = pod;
        self.generation += 1;
        Ok(())
    }

    pub fn set_node(&mut self, node: Node) {
        self.allocatable_resource = ResourceVector::from_resource_list(&node.status.allocatable);
        self.taints = node.spec.taints.clone();
        self.node = Some(node);
        self.generation += 1;
    }

    /// Clears the node attributes only; pods are left untouched. `RemoveNode`
    /// is a no-op on `pods` — the NodeInfo is only deleted once pods
    /// subsequently drain to empty.
    pub fn remove_node(&mut self) {
        self.node = None;
        self.allocatable_resource = ResourceVector::default();
        self.taints = Vec::new();
        self.generation += 1;
    }
}
