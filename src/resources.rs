//! Resource arithmetic: additive/subtractive aggregation of typed resource
//! quantities with saturating semantics.
//!
//! An open scalar resource map (GPUs, ephemeral-storage, etc.) alongside
//! the dedicated millicore/byte fields, rather than a fixed `{cpu, ram}`
//! pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical resource-list key routed to `milli_cpu`.
pub const RESOURCE_CPU: &str = "cpu";
/// Canonical resource-list key routed to `memory`.
pub const RESOURCE_MEMORY: &str = "memory";

/// A parsed, keyed resource list as handed to the cache by external
/// collaborators (quantity parsing itself is the caller's concern).
pub type ResourceList = BTreeMap<String, i64>;

/// Element-wise resource vector: millicores, bytes, and arbitrary scalar
/// resource counts. Absent scalar keys read as zero; subtraction clamps
/// each field at zero.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVector {
    pub milli_cpu: i64,
    pub memory: i64,
    pub scalar: BTreeMap<String, i64>,
}

impl ResourceVector {
    pub fn new(milli_cpu: i64, memory: i64) -> Self {
        Self {
            milli_cpu,
            memory,
            scalar: BTreeMap::new(),
        }
    }

    /// Parses a resource list into a vector: `cpu`/`memory` route to the
    /// dedicated fields, any other name becomes a scalar resource.
    pub fn from_resource_list(list: &ResourceList) -> Self {
        let mut v = ResourceVector::default();
        for (name, quantity) in list {
            match name.as_str() {
                RESOURCE_CPU => v.milli_cpu = *quantity,
                RESOURCE_MEMORY => v.memory = *quantity,
                other => {
                    v.scalar.insert(other.to_string(), *quantity);
                }
            }
        }
        v
    }

    /// Inverse of `from_resource_list`, for handing data back to callers.
    pub fn to_resource_list(&self) -> ResourceList {
        let mut list = ResourceList::new();
        if self.milli_cpu != 0 {
            list.insert(RESOURCE_CPU.to_string(), self.milli_cpu);
        }
        if self.memory != 0 {
            list.insert(RESOURCE_MEMORY.to_string(), self.memory);
        }
        for (name, quantity) in &self.scalar {
            list.insert(name.clone(), *quantity);
        }
        list
    }

    /// Element-wise addition. A scalar key present in only one operand is
    /// allocated in the result with the other side read as zero.
    pub fn add(&self, other: &ResourceVector) -> ResourceVector {
        let mut result = self.clone();
        result.add_assign(other);
        result
    }

    pub fn add_assign(&mut self, other: &ResourceVector) {
        self.milli_cpu += other.milli_cpu;
        self.memory += other.memory;
        for (name, quantity) in &other.scalar {
            *self.scalar.entry(name.clone()).or_insert(0) += quantity;
        }
    }

    /// Element-wise subtraction, saturating at zero per field.
    pub fn sub(&self, other: &ResourceVector) -> ResourceVector {
        let mut result = self.clone();
        result.sub_assign(other);
        result
    }

    pub fn sub_assign(&mut self, other: &ResourceVector) {
        self.milli_cpu = (self.milli_cpu - other.milli_cpu).max(0);
        self.memory = (self.memory - other.memory).max(0);
        for (name, quantity) in &other.scalar {
            let entry = self.scalar.entry(name.clone()).or_insert(0);
            *entry = (*entry - quantity).max(0);
        }
    }

    /// Non-zero-normalized view used only for `NodeInfo::nonzero_request`:
    /// a zero (i.e. absent) CPU or memory request is replaced by the given
    /// default. Scalar resources have no default and are dropped — they are
    /// never reflected in `nonzeroRequest`.
    pub fn nonzero(&self, default_milli_cpu: i64, default_memory: i64) -> ResourceVector {
        ResourceVector {
            milli_cpu: if self.milli_cpu == 0 {
                default_milli_cpu
            } else {
                self.milli_cpu
            },
            memory: if self.memory == 0 {
                default_memory
            } else {
                self.memory
            },
            scalar: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_allocates_scalar_key_present_on_one_side() {
        let mut a = ResourceVector::new(100, 500);
        let mut b = ResourceVector::new(50, 0);
        b.scalar.insert("nvidia.com/gpu".to_string(), 2);

        a.add_assign(&b);

        assert_eq!(a.milli_cpu, 150);
        assert_eq!(a.memory, 500);
        assert_eq!(a.scalar.get("nvidia.com/gpu"), Some(&2));
    }

    #[test]
    fn sub_saturates_at_zero() {
        let a = ResourceVector::new(100, 200);
        let b = ResourceVector::new(150, 50);

        let result = a.sub(&b);

        assert_eq!(result.milli_cpu, 0);
        assert_eq!(result.memory, 150);
    }

    #[test]
    fn sub_saturates_scalar_at_zero() {
        let mut a = ResourceVector::default();
        a.scalar.insert("gpu".to_string(), 1);
        let mut b = ResourceVector::default();
        b.scalar.insert("gpu".to_string(), 3);

        let result = a.sub(&b);

        assert_eq!(result.scalar.get("gpu"), Some(&0));
    }

    #[test]
    fn nonzero_substitutes_defaults_only_for_absent_cpu_or_memory() {
        let v = ResourceVector::new(0, 500);

        let normalized = v.nonzero(100, 200);

        assert_eq!(normalized.milli_cpu, 100);
        assert_eq!(normalized.memory, 500);
        assert!(normalized.scalar.is_empty());
    }

    #[test]
    fn resource_list_round_trip_drops_zero_entries() {
        let list: ResourceList = [(RESOURCE_CPU.to_string(), 100), ("ephemeral-storage".to_string(), 1024)]
            .into_iter()
            .collect();

        let vector = ResourceVector::from_resource_list(&list);
        assert_eq!(vector.milli_cpu, 100);
        assert_eq!(vector.memory, 0);
        assert_eq!(vector.scalar.get("ephemeral-storage"), Some(&1024));

        let back = vector.to_resource_list();
        assert_eq!(back.get(RESOURCE_CPU), Some(&100));
        assert_eq!(back.get(RESOURCE_MEMORY), None);
    }
}
