use kubescheduler_cache::pod::{Container, ContainerPort, Protocol, ResourceRequirements};
use kubescheduler_cache::resources::ResourceList;
use kubescheduler_cache::{Node, Pod};

#[allow(dead_code)]
pub fn pod_with_requests(uid: &str, node_name: &str, milli_cpu: i64, memory: i64) -> Pod {
    let mut requests = ResourceList::new();
    if milli_cpu != 0 {
        requests.insert("cpu".to_string(), milli_cpu);
    }
    if memory != 0 {
        requests.insert("memory".to_string(), memory);
    }
    let mut pod = Pod::new(uid, node_name);
    pod.spec.containers.push(Container {
        resources: ResourceRequirements { requests },
        ports: Vec::new(),
    });
    pod
}

#[allow(dead_code)]
pub fn pod_with_port(uid: &str, node_name: &str, host_port: u16) -> Pod {
    let mut pod = Pod::new(uid, node_name);
    pod.spec.containers.push(Container {
        resources: ResourceRequirements::default(),
        ports: vec![ContainerPort {
            name: None,
            protocol: Protocol::Tcp,
            host_ip: String::new(),
            host_port,
            container_port: host_port,
        }],
    });
    pod
}

#[allow(dead_code)]
pub fn bare_node(name: &str, milli_cpu: i64, memory: i64) -> Node {
    let mut node = Node::new(name);
    node.status.allocatable.insert("cpu".to_string(), milli_cpu);
    node.status.allocatable.insert("memory".to_string(), memory);
    node
}
