//! Plan specs and observed cluster state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resources provisioned for a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanSpec {
    /// Number of PostgreSQL instances (1 = single node, >1 = HA with pooler)
    pub instances: i64,
    /// CPU request and limit (e.g., "500m", "2")
    pub cpu: String,
    /// Memory request and limit (e.g., "512Mi")
    pub memory: String,
    /// Storage size (e.g., "10Gi")
    pub storage: String,
}

impl PlanSpec {
    pub fn new(instances: i64, cpu: &str, memory: &str, storage: &str) -> Self {
        Self {
            instances,
            cpu: cpu.to_string(),
            memory: memory.to_string(),
            storage: storage.to_string(),
        }
    }

    /// Plans with more than one instance get a connection pooler
    pub fn is_high_availability(&self) -> bool {
        self.instances > 1
    }
}

impl Default for PlanSpec {
    /// Spec used for plan ids the catalog doesn't know
    fn default() -> Self {
        Self::new(3, "4", "4Gi", "250Gi")
    }
}

/// Live state of a `Cluster` resource
///
/// Missing fields on the resource default to zero/empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterInfo {
    pub instance_id: String,
    pub namespace: String,
    /// Operator-reported phase (e.g., "Cluster in healthy state")
    pub phase: String,
    /// Instances reported by the operator
    pub instances: i64,
    pub ready_instances: i64,
    pub labels: BTreeMap<String, String>,
    /// Spec currently recorded on the resource
    pub spec: PlanSpec,
}
