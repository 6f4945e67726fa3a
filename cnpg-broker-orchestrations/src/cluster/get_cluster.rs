use kube::api::DynamicObject;
use serde_json::Value;
use tracing::debug;

use super::ClusterAdapter;
use crate::names;
use crate::platform::{CustomKind, PlatformResult};
use crate::types::{ClusterInfo, PlanSpec};

impl ClusterAdapter {
    /// Read the live state of an instance's `Cluster` resource
    pub async fn get_cluster(&self, instance_id: &str) -> PlatformResult<ClusterInfo> {
        let object = self
            .platform
            .get_custom(
                CustomKind::Cluster,
                names::namespace(instance_id),
                names::cluster(instance_id),
            )
            .await?;

        let info = cluster_info(instance_id, &object);
        debug!(
            instance_id,
            phase = %info.phase,
            instances = info.instances,
            ready = info.ready_instances,
            "Read cluster"
        );
        Ok(info)
    }
}

fn cluster_info(instance_id: &str, object: &DynamicObject) -> ClusterInfo {
    let data = &object.data;
    ClusterInfo {
        instance_id: instance_id.to_string(),
        namespace: names::namespace(instance_id).to_string(),
        phase: string_at(data, "/status/phase"),
        instances: int_at(data, "/status/instances"),
        ready_instances: int_at(data, "/status/readyInstances"),
        labels: object.metadata.labels.clone().unwrap_or_default(),
        spec: PlanSpec {
            instances: int_at(data, "/spec/instances"),
            cpu: string_at(data, "/spec/resources/requests/cpu"),
            memory: string_at(data, "/spec/resources/requests/memory"),
            storage: string_at(data, "/spec/storage/size"),
        },
    }
}

fn int_at(data: &Value, pointer: &str) -> i64 {
    data.pointer(pointer).and_then(Value::as_i64).unwrap_or(0)
}

/// Quantities may be stored as numbers (`cpu: 2`), so those are stringified
fn string_at(data: &Value, pointer: &str) -> String {
    match data.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{adapter, DEV_SMALL, INSTANCE_ID};
    use crate::mock::MockPlatform;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_cluster_reads_status_and_spec() {
        let platform = Arc::new(MockPlatform::new());
        let adapter = adapter(&platform);
        adapter.create_cluster(INSTANCE_ID, DEV_SMALL).await.unwrap();
        platform.set_cluster_status(INSTANCE_ID, "Cluster in healthy state", 1, 1);

        let info = adapter.get_cluster(INSTANCE_ID).await.unwrap();
        assert_eq!(info.namespace, INSTANCE_ID);
        assert_eq!(info.phase, "Cluster in healthy state");
        assert_eq!(info.instances, 1);
        assert_eq!(info.ready_instances, 1);
        assert_eq!(info.spec, PlanSpec::new(1, "500m", "512Mi", "10Gi"));
        assert_eq!(info.labels["cnpg-broker/plan-id"], DEV_SMALL);
    }

    #[tokio::test]
    async fn test_missing_cluster_is_not_found() {
        let platform = Arc::new(MockPlatform::new());
        let err = adapter(&platform).get_cluster(INSTANCE_ID).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let object = DynamicObject {
            types: None,
            metadata: Default::default(),
            data: json!({"spec": {"resources": {"requests": {"cpu": 2}}}}),
        };

        let info = cluster_info(INSTANCE_ID, &object);
        assert_eq!(info.phase, "");
        assert_eq!(info.instances, 0);
        assert_eq!(info.ready_instances, 0);
        assert!(info.labels.is_empty());
        assert_eq!(info.spec.cpu, "2");
        assert_eq!(info.spec.storage, "");
    }
}
