use serde_json::json;
use tracing::{info, warn};

use super::ClusterAdapter;
use crate::names;
use crate::platform::{CustomKind, PlatformResult};
use crate::types::PlanSpec;

impl ClusterAdapter {
    /// Merge-patch the cluster's instance count, storage and resources.
    ///
    /// `current` is the spec read before the update; crossing the single-node
    /// boundary does not add or remove the pooler.
    pub async fn update_cluster(
        &self,
        instance_id: &str,
        current: &PlanSpec,
        spec: &PlanSpec,
    ) -> PlatformResult<()> {
        info!(
            instance_id,
            instances = spec.instances,
            cpu = %spec.cpu,
            memory = %spec.memory,
            storage = %spec.storage,
            "Updating cluster"
        );

        if current.is_high_availability() != spec.is_high_availability() {
            warn!(
                instance_id,
                from = current.instances,
                to = spec.instances,
                "Instance count crosses the pooler threshold; pooler left unchanged"
            );
        }

        let patch = json!({
            "spec": {
                "instances": spec.instances,
                "storage": { "size": spec.storage },
                "resources": {
                    "requests": { "cpu": spec.cpu, "memory": spec.memory },
                    "limits": { "cpu": spec.cpu, "memory": spec.memory },
                },
            }
        });

        self.platform
            .patch_custom(
                CustomKind::Cluster,
                names::namespace(instance_id),
                names::cluster(instance_id),
                &patch,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{adapter, DEV_SMALL, INSTANCE_ID};
    use crate::mock::MockPlatform;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_update_patches_spec_fields() {
        let platform = Arc::new(MockPlatform::new());
        let adapter = adapter(&platform);
        adapter.create_cluster(INSTANCE_ID, DEV_SMALL).await.unwrap();
        platform.set_cluster_status(INSTANCE_ID, "Cluster in healthy state", 1, 1);

        let current = PlanSpec::new(1, "500m", "512Mi", "10Gi");
        let spec = PlanSpec::new(1, "2", "2Gi", "50Gi");
        adapter.update_cluster(INSTANCE_ID, &current, &spec).await.unwrap();

        let info = adapter.get_cluster(INSTANCE_ID).await.unwrap();
        assert_eq!(info.spec, spec);
        // status untouched by the patch
        assert_eq!(info.phase, "Cluster in healthy state");

        let cluster = platform.custom(CustomKind::Cluster, INSTANCE_ID, INSTANCE_ID).unwrap();
        assert_eq!(cluster.data["spec"]["resources"]["limits"]["memory"], "2Gi");
    }

    #[tokio::test]
    async fn test_update_does_not_add_pooler() {
        let platform = Arc::new(MockPlatform::new());
        let adapter = adapter(&platform);
        adapter.create_cluster(INSTANCE_ID, DEV_SMALL).await.unwrap();

        let current = PlanSpec::new(1, "500m", "512Mi", "10Gi");
        let spec = PlanSpec::new(3, "1", "1Gi", "10Gi");
        adapter.update_cluster(INSTANCE_ID, &current, &spec).await.unwrap();

        assert!(platform
            .custom(CustomKind::Pooler, INSTANCE_ID, &names::pooler(INSTANCE_ID))
            .is_none());
        assert_eq!(platform.service_count(INSTANCE_ID), 1);
    }

    #[tokio::test]
    async fn test_update_of_missing_cluster_is_not_found() {
        let platform = Arc::new(MockPlatform::new());
        let spec = PlanSpec::new(1, "2", "2Gi", "50Gi");
        let err = adapter(&platform)
            .update_cluster(INSTANCE_ID, &spec, &spec)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
