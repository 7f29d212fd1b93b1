mod helpers;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kubescheduler_cache::pod::{Container, ContainerPort, Protocol, ResourceRequirements};
use kubescheduler_cache::resources::ResourceList;
use kubescheduler_cache::{Cache, CacheConfig, CacheError, Node, NodeInfo, Pod};

use helpers::{bare_node, pod_with_port, pod_with_requests};

fn snapshot(cache: &Cache) -> HashMap<String, NodeInfo> {
    let mut dst = HashMap::new();
    cache.update_node_name_to_info_map(&mut dst);
    dst
}

#[test]
fn scenario_assume_and_forget() {
    let cache = Cache::new_without_sweeper(CacheConfig::default().with_ttl(Duration::from_secs(1)));
    let pod = pod_with_requests("A", "N", 100, 500);

    cache.assume_pod(pod.clone()).unwrap();

    let dst = snapshot(&cache);
    let node_info = &dst["N"];
    assert_eq!(node_info.pods().iter().map(|p| p.uid()).collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(node_info.requested_resource().milli_cpu, 100);
    assert_eq!(node_info.requested_resource().memory, 500);

    cache.forget_pod(&pod).unwrap();

    assert!(!snapshot(&cache).contains_key("N"));
}

#[test]
fn scenario_assume_expire_re_add() {
    let cache = Cache::new_without_sweeper(CacheConfig::default().with_ttl(Duration::from_secs(10)));
    let pod = pod_with_requests("A", "N", 100, 500);
    let t = Instant::now();

    cache.assume_pod(pod.clone()).unwrap();
    cache.finish_binding(&pod, t).unwrap();
    cache.cleanup_assumed_pods(t + Duration::from_secs(20));

    assert!(!snapshot(&cache).contains_key("N"));

    cache.add_pod(pod).unwrap();

    let dst = snapshot(&cache);
    let node_info = &dst["N"];
    assert_eq!(node_info.pods().len(), 1);
    assert_eq!(node_info.requested_resource().milli_cpu, 100);
    assert_eq!(node_info.requested_resource().memory, 500);
}

#[test]
fn scenario_cross_node_confirmation() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    let assumed = pod_with_requests("A", "assumed-node", 0, 0);
    cache.assume_pod(assumed).unwrap();

    let confirmed = pod_with_requests("A", "actual-node", 100, 0);
    cache.add_pod(confirmed).unwrap();

    let dst = snapshot(&cache);
    assert!(!dst.contains_key("assumed-node"));
    assert_eq!(dst["actual-node"].pods().len(), 1);

    let old = pod_with_requests("A", "actual-node", 100, 0);
    let mut new = pod_with_requests("A", "actual-node", 200, 0);
    new.spec.containers[0].ports.push(ContainerPort {
        name: None,
        protocol: Protocol::Tcp,
        host_ip: String::new(),
        host_port: 90,
        container_port: 90,
    });
    cache.update_pod(&old, new).unwrap();

    let dst = snapshot(&cache);
    let node_info = &dst["actual-node"];
    assert_eq!(node_info.requested_resource().milli_cpu, 200);
    assert_eq!(node_info.used_ports().len(), 1);
    assert!(node_info.used_ports().contains("TCP/0.0.0.0/90"));
}

#[test]
fn scenario_same_node_confirmation_does_not_reaggregate() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    let assumed = pod_with_requests("A", "N", 100, 500);
    cache.assume_pod(assumed).unwrap();

    // The authoritative pod differs cosmetically (namespace set) but keeps
    // the same node and resource requests: confirming it must replace the
    // assumed pod in place, not add its resources a second time.
    let mut confirmed = pod_with_requests("A", "N", 100, 500);
    confirmed.metadata.namespace = "default".to_string();
    cache.add_pod(confirmed).unwrap();

    let dst = snapshot(&cache);
    let node_info = &dst["N"];
    assert_eq!(node_info.pods().len(), 1);
    assert_eq!(node_info.requested_resource().milli_cpu, 100);
    assert_eq!(node_info.requested_resource().memory, 500);
    assert!(!cache.is_assumed_pod("A"));
}

#[test]
fn scenario_add_pod_on_already_bound_pod_is_already_bound() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    let pod = pod_with_requests("A", "N", 100, 500);
    cache.add_pod(pod.clone()).unwrap();

    let err = cache.add_pod(pod).unwrap_err();
    assert_eq!(err, CacheError::AlreadyBound("A".to_string()));

    let dst = snapshot(&cache);
    assert_eq!(dst["N"].pods().len(), 1);
    assert_eq!(dst["N"].requested_resource().milli_cpu, 100);
}

#[test]
fn scenario_non_zero_defaults() {
    let cache = Cache::new_without_sweeper(
        CacheConfig::default()
            .with_ttl(Duration::from_secs(10)),
    );
    let mut pod = Pod::new("A", "N");
    pod.spec.containers.push(Container {
        resources: ResourceRequirements::default(),
        ports: Vec::new(),
    });
    cache.assume_pod(pod).unwrap();

    let dst = snapshot(&cache);
    let node_info = &dst["N"];
    assert_eq!(node_info.requested_resource().milli_cpu, 0);
    assert_eq!(node_info.requested_resource().memory, 0);

    let config = CacheConfig::default();
    assert_eq!(node_info.nonzero_request().milli_cpu, config.default_milli_cpu_request);
    assert_eq!(node_info.nonzero_request().memory, config.default_memory_request);
}

#[test]
fn scenario_port_encoding_edge_cases() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());

    cache.assume_pod(pod_with_port("A", "N1", 80)).unwrap();
    let dst = snapshot(&cache);
    assert!(dst["N1"].used_ports().contains("TCP/0.0.0.0/80"));

    cache.assume_pod(pod_with_port("B", "N2", 0)).unwrap();
    let dst = snapshot(&cache);
    assert!(dst["N2"].used_ports().is_empty());

    let mut pod_with_explicit_ip = pod_with_port("C", "N3", 80);
    pod_with_explicit_ip.spec.containers[0].ports[0].host_ip = "127.0.0.1".to_string();
    cache.assume_pod(pod_with_explicit_ip).unwrap();
    let dst = snapshot(&cache);
    assert!(dst["N3"].used_ports().contains("TCP/127.0.0.1/80"));
}

#[test]
fn scenario_node_removal_with_live_pods() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    let node = bare_node("N", 1000, 1024);
    cache.add_node(node.clone());

    let pod = pod_with_requests("A", "N", 100, 200);
    cache.add_pod(pod.clone()).unwrap();

    cache.remove_node(&node);

    let dst = snapshot(&cache);
    let node_info = &dst["N"];
    assert!(node_info.node().is_none());
    assert_eq!(node_info.pods().len(), 1);

    cache.remove_pod(&pod).unwrap();

    assert!(!snapshot(&cache).contains_key("N"));
}

#[test]
fn add_node_twice_keeps_single_entry_with_fresh_attributes() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    cache.add_node(bare_node("N", 1000, 1024));
    cache.add_node(bare_node("N", 2000, 2048));

    let dst = snapshot(&cache);
    assert_eq!(dst["N"].allocatable_resource().milli_cpu, 2000);
}

#[test]
fn unknown_node_is_lazily_created_on_first_pod() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    let pod = pod_with_requests("A", "never-added-explicitly", 10, 20);
    cache.add_pod(pod).unwrap();

    let dst = snapshot(&cache);
    assert!(dst["never-added-explicitly"].node().is_none());
    assert_eq!(dst["never-added-explicitly"].pods().len(), 1);
}

#[test]
fn remove_node_unknown_to_the_cache_is_a_no_op() {
    let cache = Cache::new_without_sweeper(CacheConfig::default());
    cache.remove_node(&Node::new("ghost"));
    assert!(!snapshot(&cache).contains_key("ghost"));
}
