//! The cache facade: `AssumePod`, `FinishBinding`, `ForgetPod`, `AddPod`,
//! `UpdatePod`, `RemovePod`, node and PDB maintenance, snapshot export, and
//! the background sweeper.
//!
//! All mutable state lives behind one `Arc<RwLock<CacheInner>>`: the pod
//! state table, the per-node aggregates, the PDB store, and the expiry
//! queue are bundled into `CacheInner` so the facade's methods and the
//! sweeper thread share a single lock rather than one each.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::expirer::AssumptionExpirer;
use crate::node::Node;
use crate::node_info::NodeInfo;
use crate::pdb::{PdbStore, PodDisruptionBudget};
use crate::pod::Pod;
use crate::selector::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PodState {
    Assumed,
    Bound,
}

#[derive(Debug, Clone)]
struct PodEntry {
    pod: Pod,
    state: PodState,
    binding_deadline: Option<Instant>,
}

/// Everything the lock protects. Kept separate from `Cache` so the sweeper
/// thread and the facade's methods share one lock without either owning it.
#[derive(Default)]
struct CacheInner {
    pods: HashMap<String, PodEntry>,
    nodes: HashMap<String, NodeInfo>,
    pdbs: PdbStore,
    expirer: AssumptionExpirer,
    config: CacheConfig,
}

impl CacheInner {
    fn defaults(&self) -> (i64, i64) {
        (
            self.config.default_milli_cpu_request,
            self.config.default_memory_request,
        )
    }

    fn deaggregate(&mut self, node_name: &str, uid: &str) -> Result<()> {
        let (default_cpu, default_mem) = self.defaults();
        let info = self
            .nodes
            .get_mut(node_name)
            .ok_or_else(|| CacheError::NotFound(node_name.to_string()))?;
        info.remove_pod(uid, default_cpu, default_mem)?;
        if info.is_empty() {
            self.nodes.remove(node_name);
        }
        Ok(())
    }

    fn aggregate(&mut self, pod: Pod) {
        let (default_cpu, default_mem) = self.defaults();
        let node_name = pod.node_name().to_string();
        self.nodes
            .entry(node_name)
            .or_insert_with(NodeInfo::new)
            .add_pod(pod, default_cpu, default_mem);
    }

    /// Removes and re-adds a pod on the same `NodeInfo` instance, instead of
    /// routing through `deaggregate`+`aggregate`. For a lazily-created
    /// NodeInfo (no `AddNode` ever called) with a single resident pod,
    /// deaggregating would make `is_empty()` true and drop the NodeInfo —
    /// and with it, its `generation` — only for `aggregate` to recreate a
    /// fresh one starting back at generation 0. That fresh NodeInfo then
    /// lands on exactly the generation value an already-cached snapshot
    /// holds, so `UpdateNodeNameToInfoMap` treats the node as unchanged and
    /// the update is invisible to callers. Mutating in place keeps the
    /// NodeInfo (and its generation counter) alive across the update.
    fn reaggregate_in_place(&mut self, node_name: &str, uid: &str, new: Pod) -> Result<()> {
        let (default_cpu, default_mem) = self.defaults();
        let info = self
            .nodes
            .get_mut(node_name)
            .ok_or_else(|| CacheError::NotFound(node_name.to_string()))?;
        info.remove_pod(uid, default_cpu, default_mem)?;
        info.add_pod(new, default_cpu, default_mem);
        Ok(())
    }

    fn assume_pod(&mut self, pod: Pod) -> Result<()> {
        let uid = pod.uid().to_string();
        if self.pods.contains_key(&uid) {
            return Err(CacheError::AlreadyExists(uid));
        }
        self.aggregate(pod.clone());
        self.pods.insert(
            uid,
            PodEntry {
                pod,
                state: PodState::Assumed,
                binding_deadline: None,
            },
        );
        Ok(())
    }

    fn finish_binding(&mut self, pod: &Pod, now: Instant) -> Result<()> {
        let uid = pod.uid();
        let ttl = self.config.ttl();
        let entry = self
            .pods
            .get_mut(uid)
            .ok_or_else(|| CacheError::NotAssumed(uid.to_string()))?;
        if entry.state != PodState::Assumed {
            return Err(CacheError::NotAssumed(uid.to_string()));
        }
        let deadline = now + ttl;
        entry.binding_deadline = Some(deadline);
        self.expirer.track(uid.to_string(), deadline);
        Ok(())
    }

    fn forget_pod(&mut self, pod: &Pod) -> Result<()> {
        let uid = pod.uid();
        let entry = self
            .pods
            .get(uid)
            .ok_or_else(|| CacheError::NotAssumed(uid.to_string()))?;
        if entry.state != PodState::Assumed {
            return Err(CacheError::NotAssumed(uid.to_string()));
        }
        if entry.pod.node_name() != pod.node_name() {
            return Err(CacheError::NodenameMismatch {
                uid: uid.to_string(),
                recorded: entry.pod.node_name().to_string(),
                got: pod.node_name().to_string(),
            });
        }
        let node_name = entry.pod.node_name().to_string();
        self.pods.remove(uid);
        self.deaggregate(&node_name, uid)
    }

    fn add_pod(&mut self, pod: Pod) -> Result<()> {
        let uid = pod.uid().to_string();
        match self.pods.get(&uid).map(|e| e.state) {
            Some(PodState::Bound) => Err(CacheError::AlreadyBound(uid)),
            Some(PodState::Assumed) => {
                let recorded_node = self.pods[&uid].pod.node_name().to_string();
                if recorded_node == pod.node_name() {
                    if let Some(info) = self.nodes.get_mut(&recorded_node) {
                        info.replace_pod_in_place(&uid, pod.clone())?;
                    }
                } else {
                    self.deaggregate(&recorded_node, &uid)?;
                    self.aggregate(pod.clone());
                }
                self.pods.insert(
                    uid,
                    PodEntry {
                        pod,
                        state: PodState::Bound,
                        binding_deadline: None,
                    },
                );
                Ok(())
            }
            None => {
                self.aggregate(pod.clone());
                self.pods.insert(
                    uid,
                    PodEntry {
                        pod,
                        state: PodState::Bound,
                        binding_deadline: None,
                    },
                );
                Ok(())
            }
        }
    }

    fn update_pod(&mut self, old: &Pod, new: Pod) -> Result<()> {
        let uid = old.uid();
        let entry = self
            .pods
            .get(uid)
            .ok_or_else(|| CacheError::NotFound(uid.to_string()))?;
        if entry.state != PodState::Bound {
            return Err(CacheError::NotBound(uid.to_string()));
        }
        let old_node_name = entry.pod.node_name().to_string();
        if old_node_name == new.node_name() {
            self.reaggregate_in_place(&old_node_name, uid, new.clone())?;
        } else {
            self.deaggregate(&old_node_name, uid)?;
            self.aggregate(new.clone());
        }
        self.pods.insert(
            uid.to_string(),
            PodEntry {
                pod: new,
                state: PodState::Bound,
                binding_deadline: None,
            },
        );
        Ok(())
    }

    fn remove_pod(&mut self, pod: &Pod) -> Result<()> {
        let uid = pod.uid();
        let entry = self
            .pods
            .get(uid)
            .ok_or_else(|| CacheError::NotFound(uid.to_string()))?;
        if entry.state != PodState::Bound {
            return Err(CacheError::NotBound(uid.to_string()));
        }
        let node_name = entry.pod.node_name().to_string();
        self.pods.remove(uid);
        self.deaggregate(&node_name, uid)
    }

    fn add_node(&mut self, node: Node) {
        self.nodes
            .entry(node.name().to_string())
            .or_insert_with(NodeInfo::new)
            .set_node(node);
    }

    fn update_node(&mut self, _old: &Node, new: Node) {
        self.add_node(new);
    }

    fn remove_node(&mut self, node: &Node) {
        if let Some(info) = self.nodes.get_mut(node.name()) {
            info.remove_node();
            if info.is_empty() {
                self.nodes.remove(node.name());
            }
        }
    }

    fn is_assumed_pod(&self, uid: &str) -> bool {
        self.pods
            .get(uid)
            .map(|e| e.state == PodState::Assumed)
            .unwrap_or(false)
    }

    fn get_pod(&self, uid: &str) -> Result<Pod> {
        self.pods
            .get(uid)
            .map(|e| e.pod.clone())
            .ok_or_else(|| CacheError::NotFound(uid.to_string()))
    }

    fn list(&self, selector: &dyn Selector) -> Vec<Pod> {
        self.pods
            .values()
            .filter(|e| selector.matches(e.pod.labels()))
            .map(|e| e.pod.clone())
            .collect()
    }

    fn update_node_name_to_info_map(&self, dst: &mut HashMap<String, NodeInfo>) {
        for (name, info) in &self.nodes {
            let up_to_date = dst
                .get(name)
                .map(|cached| cached.generation() == info.generation())
                .unwrap_or(false);
            if !up_to_date {
                dst.insert(name.clone(), info.clone());
            }
        }
        let stale: Vec<String> = dst
            .keys()
            .filter(|name| !self.nodes.contains_key(*name))
            .cloned()
            .collect();
        for name in stale {
            dst.remove(&name);
        }
    }

    /// Sweeps every expirer entry whose deadline has passed `now`, dropping
    /// it the way `ForgetPod` would. Entries whose pod was already confirmed
    /// or forgotten since being queued are silently discarded (see
    /// `AssumptionExpirer::pop_due`). Never panics: an inconsistency (the
    /// pod table and the NodeInfo map disagreeing) is logged and skipped.
    fn cleanup_assumed_pods(&mut self, now: Instant) -> usize {
        let due = self.expirer.pop_due(now);
        let mut expired = 0;
        for entry in due {
            let still_live = matches!(
                self.pods.get(&entry.uid),
                Some(pe) if pe.state == PodState::Assumed && pe.binding_deadline == Some(entry.deadline)
            );
            if !still_live {
                trace!("sweeper: skipping stale expirer entry for pod {}", entry.uid);
                continue;
            }
            let node_name = self.pods[&entry.uid].pod.node_name().to_string();
            self.pods.remove(&entry.uid);
            match self.deaggregate(&node_name, &entry.uid) {
                Ok(()) => {
                    expired += 1;
                    trace!(
                        "sweeper: expired assumed pod {} on node {}",
                        entry.uid,
                        node_name
                    );
                }
                Err(err) => {
                    warn!(
                        "sweeper: inconsistent state deaggregating expired pod {}: {}",
                        entry.uid, err
                    );
                }
            }
        }
        debug!(
            "sweeper: cleanup complete, {} expired, {} pending",
            expired,
            self.expirer.len()
        );
        expired
    }
}

/// Public, thread-safe handle onto the scheduler cache.
pub struct Cache {
    inner: Arc<RwLock<CacheInner>>,
    stop_tx: Option<mpsc::Sender<()>>,
    sweeper: Option<thread::JoinHandle<()>>,
}

impl Cache {
    /// Builds a cache with its background sweeper thread running, ticking
    /// `cleanup_assumed_pods(Instant::now())` every `config.sweep_interval()`
    /// until `stop_tx` is signaled or dropped.
    pub fn new(config: CacheConfig) -> Self {
        let sweep_interval = config.sweep_interval();
        let inner = Arc::new(RwLock::new(CacheInner {
            config,
            ..Default::default()
        }));
        let (stop_tx, stop_rx) = mpsc::channel();
        let sweeper_inner = Arc::clone(&inner);
        let sweeper = thread::spawn(move || run_sweeper(sweeper_inner, sweep_interval, stop_rx));
        Self {
            inner,
            stop_tx: Some(stop_tx),
            sweeper: Some(sweeper),
        }
    }

    /// Builds a cache without a background sweeper; callers drive expiry
    /// explicitly via `cleanup_assumed_pods`. Used by tests that need
    /// deterministic control over simulated time.
    pub fn new_without_sweeper(config: CacheConfig) -> Self {
        let inner = Arc::new(RwLock::new(CacheInner {
            config,
            ..Default::default()
        }));
        Self {
            inner,
            stop_tx: None,
            sweeper: None,
        }
    }

    pub fn assume_pod(&self, pod: Pod) -> Result<()> {
        self.inner.write().unwrap().assume_pod(pod)
    }

    pub fn finish_binding(&self, pod: &Pod, now: Instant) -> Result<()> {
        self.inner.write().unwrap().finish_binding(pod, now)
    }

    pub fn forget_pod(&self, pod: &Pod) -> Result<()> {
        self.inner.write().unwrap().forget_pod(pod)
    }

    pub fn add_pod(&self, pod: Pod) -> Result<()> {
        self.inner.write().unwrap().add_pod(pod)
    }

    pub fn update_pod(&self, old: &Pod, new: Pod) -> Result<()> {
        self.inner.write().unwrap().update_pod(old, new)
    }

    pub fn remove_pod(&self, pod: &Pod) -> Result<()> {
        self.inner.write().unwrap().remove_pod(pod)
    }

    pub fn add_node(&self, node: Node) {
        self.inner.write().unwrap().add_node(node)
    }

    pub fn update_node(&self, old: &Node, new: Node) {
        self.inner.write().unwrap().update_node(old, new)
    }

    pub fn remove_node(&self, node: &Node) {
        self.inner.write().unwrap().remove_node(node)
    }

    pub fn add_pdb(&self, pdb: PodDisruptionBudget) {
        self.inner.write().unwrap().pdbs.add(pdb)
    }

    pub fn update_pdb(&self, old: &PodDisruptionBudget, new: PodDisruptionBudget) {
        self.inner.write().unwrap().pdbs.update(old, new)
    }

    pub fn remove_pdb(&self, namespace: &str, name: &str) {
        self.inner.write().unwrap().pdbs.remove(namespace, name)
    }

    pub fn list_pdbs(&self, selector: &dyn Selector) -> Vec<PodDisruptionBudget> {
        self.inner.read().unwrap().pdbs.list(selector)
    }

    pub fn is_assumed_pod(&self, uid: &str) -> bool {
        self.inner.read().unwrap().is_assumed_pod(uid)
    }

    pub fn get_pod(&self, uid: &str) -> Result<Pod> {
        self.inner.read().unwrap().get_pod(uid)
    }

    pub fn list(&self, selector: &dyn Selector) -> Vec<Pod> {
        self.inner.read().unwrap().list(selector)
    }

    pub fn update_node_name_to_info_map(&self, dst: &mut HashMap<String, NodeInfo>) {
        self.inner.read().unwrap().update_node_name_to_info_map(dst)
    }

    /// Runs one sweep pass immediately, returning how many assumptions were
    /// expired. Exposed for tests and for callers that want to drive the
    /// sweeper on their own schedule instead of the background thread.
    pub fn cleanup_assumed_pods(&self, now: Instant) -> usize {
        self.inner.write().unwrap().cleanup_assumed_pods(now)
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.sweeper.take() {
            let _ = handle.join();
        }
    }
}

fn run_sweeper(inner: Arc<RwLock<CacheInner>>, sweep_interval: Duration, stop_rx: mpsc::Receiver<()>) {
    loop {
        match stop_rx.recv_timeout(sweep_interval) {
            Ok(()) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                inner.write().unwrap().cleanup_assumed_pods(Instant::now());
            }
        }
    }
}
