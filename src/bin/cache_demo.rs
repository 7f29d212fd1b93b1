//! Small CLI that drives a `Cache` through a scheduling-style sequence —
//! assume, bind, and forget — and prints the resulting node snapshot,
//! against real wall-clock time.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;

use kubescheduler_cache::pod::{Container, ResourceRequirements};
use kubescheduler_cache::resources::ResourceList;
use kubescheduler_cache::{Cache, CacheConfig, Everything, Node, Pod};

/// Run a short assume/bind/forget scenario against an in-memory scheduler cache.
#[derive(Parser, Debug)]
struct Args {
    /// Assumed-pod binding deadline, in seconds.
    #[arg(long, default_value_t = 2)]
    ttl_secs: u64,

    /// How long the demo pod is left unbound before the sweeper is checked.
    #[arg(long, default_value_t = 3)]
    wait_secs: u64,
}

fn demo_pod(uid: &str, node_name: &str, milli_cpu: i64, memory: i64) -> Pod {
    let mut requests = ResourceList::new();
    requests.insert("cpu".to_string(), milli_cpu);
    requests.insert("memory".to_string(), memory);
    let mut pod = Pod::new(uid, node_name);
    pod.spec.containers.push(Container {
        resources: ResourceRequirements { requests },
        ports: Vec::new(),
    });
    pod
}

fn print_snapshot(cache: &Cache) {
    let mut snapshot: HashMap<String, kubescheduler_cache::NodeInfo> = HashMap::new();
    cache.update_node_name_to_info_map(&mut snapshot);
    for (name, info) in &snapshot {
        info!(
            "node {name}: {} pods, requested cpu={} memory={}",
            info.pods().len(),
            info.requested_resource().milli_cpu,
            info.requested_resource().memory,
        );
    }
    let all_pods = cache.list(&Everything);
    info!("{} pods visible across the cluster", all_pods.len());
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let cache = Cache::new_without_sweeper(
        CacheConfig::default().with_ttl(Duration::from_secs(args.ttl_secs)),
    );

    cache.add_node(Node::new("node-1"));

    let pod = demo_pod("demo-pod", "node-1", 250, 512 * 1024 * 1024);
    cache.assume_pod(pod.clone()).expect("assume new pod");
    info!("assumed pod {} on node-1", pod.uid());

    let now = Instant::now();
    cache
        .finish_binding(&pod, now)
        .expect("finish binding just-assumed pod");
    info!("finished binding, deadline in {}s", args.ttl_secs);

    print_snapshot(&cache);

    thread::sleep(Duration::from_secs(args.wait_secs));

    let expired = cache.cleanup_assumed_pods(Instant::now());
    info!("sweep reclaimed {expired} expired assumption(s)");

    print_snapshot(&cache);
}
