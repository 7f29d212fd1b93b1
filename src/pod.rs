//! Pod type as observed from the cluster authority, plus the resource/port
//! accounting derived from its containers.
//!
//! `metadata`/`spec` nesting with a container list, so ports and
//! per-container non-zero normalization are representable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::resources::{ResourceList, ResourceVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Sctp => "SCTP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPort {
    #[serde(default)]
    pub name: Option<String>,
    pub protocol: Protocol,
    #[serde(default)]
    pub host_ip: String,
    pub host_port: u16,
    pub container_port: u16,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub requests: ResourceList,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub resources: ResourceRequirements,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodMeta {
    pub uid: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub node_name: String,
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: PodMeta,
    pub spec: PodSpec,
}

impl Pod {
    pub fn new(uid: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            metadata: PodMeta {
                uid: uid.into(),
                ..Default::default()
            },
            spec: PodSpec {
                node_name: node_name.into(),
                containers: Vec::new(),
            },
        }
    }

    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    pub fn node_name(&self) -> &str {
        &self.spec.node_name
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.metadata.labels
    }

    /// Sum of each container's declared resource requests (`requestedResource`).
    pub fn declared_requests(&self) -> ResourceVector {
        let mut total = ResourceVector::default();
        for container in &self.spec.containers {
            total.add_assign(&ResourceVector::from_resource_list(
                &container.resources.requests,
            ));
        }
        total
    }

    /// Sum of each container's non-zero-normalized resource requests
    /// (`nonzeroRequest`). Normalization happens per container, before
    /// summing, so a container with no memory request still contributes the
    /// default even when a sibling container's memory request is non-zero.
    pub fn nonzero_requests(&self, default_milli_cpu: i64, default_memory: i64) -> ResourceVector {
        let mut total = ResourceVector::default();
        for container in &self.spec.containers {
            let declared = ResourceVector::from_resource_list(&container.resources.requests);
            total.add_assign(&declared.nonzero(default_milli_cpu, default_memory));
        }
        total
    }

    /// Host-port set for this pod, encoded `"<protocol>/<hostIP>/<hostPort>"`.
    /// `hostPort == 0` is excluded; an empty `hostIP` is normalized to `0.0.0.0`.
    pub fn used_ports(&self) -> BTreeSet<String> {
        let mut ports = BTreeSet::new();
        for container in &self.spec.containers {
            for port in &container.ports {
                if port.host_port == 0 {
                    continue;
                }
                let host_ip = if port.host_ip.is_empty() {
                    "0.0.0.0"
                } else {
                    &port.host_ip
                };
                ports.insert(format!(
                    "{}/{}/{}",
                    port.protocol.as_str(),
                    host_ip,
                    port.host_port
                ));
            }
        }
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_requests(cpu: i64, memory: i64) -> Container {
        let mut requests = ResourceList::new();
        if cpu != 0 {
            requests.insert("cpu".to_string(), cpu);
        }
        if memory != 0 {
            requests.insert("memory".to_string(), memory);
        }
        Container {
            resources: ResourceRequirements { requests },
            ports: Vec::new(),
        }
    }

    #[test]
    fn nonzero_requests_normalizes_per_container_before_summing() {
        let mut pod = Pod::new("A", "N");
        pod.spec.containers.push(container_with_requests(100, 0));
        pod.spec.containers.push(container_with_requests(0, 500));

        let nonzero = pod.nonzero_requests(50, 200);

        // container 1: (100, 200 default); container 2: (50 default, 500)
        assert_eq!(nonzero.milli_cpu, 150);
        assert_eq!(nonzero.memory, 700);
    }

    #[test]
    fn used_ports_excludes_zero_port_and_normalizes_empty_host_ip() {
        let mut pod = Pod::new("A", "N");
        let mut container = Container::default();
        container.ports.push(ContainerPort {
            name: None,
            protocol: Protocol::Tcp,
            host_ip: String::new(),
            host_port: 80,
            container_port: 8080,
        });
        container.ports.push(ContainerPort {
            name: None,
            protocol: Protocol::Tcp,
            host_ip: "127.0.0.1".to_string(),
            host_port: 0,
            container_port: 8081,
        });
        pod.spec.containers.push(container);

        let ports = pod.used_ports();

        assert_eq!(ports.len(), 1);
        assert!(ports.contains("TCP/0.0.0.0/80"));
    }
}
