use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use super::{render_error, ClusterAdapter};
use crate::names::{self, POOLER_PORT, POSTGRES_PORT};
use crate::platform::{CustomKind, PlatformError, PlatformResult};
use crate::types::PlanSpec;

impl ClusterAdapter {
    /// Create the namespace, cluster and network entrypoints of an instance.
    ///
    /// Only the namespace step reports `AlreadyExists`; it is the atomic
    /// create-if-absent that concurrent provisioners race on. Steps run in
    /// order and the first failure aborts the sequence.
    pub async fn create_cluster(&self, instance_id: &str, plan_id: &str) -> PlatformResult<()> {
        info!(instance_id, plan_id, "Creating cluster");

        // 1. Namespace
        let namespace = self
            .manifests
            .namespace(instance_id, plan_id)
            .map_err(render_error)?;
        self.platform.create_namespace(&namespace).await?;
        debug!(instance_id, "Namespace created");

        let spec = self.catalog.plan_spec(plan_id);
        match self.create_resources(instance_id, plan_id, &spec).await {
            Ok(()) => {
                info!(instance_id, instances = spec.instances, "Cluster resources created");
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    PlatformError::AlreadyExists(message) => {
                        PlatformError::Other(format!("already exists: {}", message))
                    }
                    other => other,
                };
                error!(instance_id, error = %err, "Failed to create cluster resources");

                if self.options.rollback_on_failure {
                    self.cleanup_on_failure(instance_id).await;
                }
                Err(err)
            }
        }
    }

    async fn create_resources(
        &self,
        instance_id: &str,
        plan_id: &str,
        spec: &PlanSpec,
    ) -> PlatformResult<()> {
        let namespace = names::namespace(instance_id);

        // 2. Cluster
        let cluster = self
            .manifests
            .cluster(instance_id, plan_id, spec)
            .map_err(render_error)?;
        self.platform
            .create_custom(CustomKind::Cluster, namespace, &cluster)
            .await?;
        debug!(instance_id, "Cluster resource created");

        // 3. Load balancer in front of the primary
        let selector = BTreeMap::from([
            ("cnpg.io/cluster", names::cluster(instance_id).to_string()),
            ("cnpg.io/instanceRole", "primary".to_string()),
        ]);
        let service = self
            .manifests
            .load_balancer(
                instance_id,
                &names::primary_lb_service(instance_id),
                POSTGRES_PORT,
                &selector,
            )
            .map_err(render_error)?;
        self.platform.create_service(namespace, &service).await?;
        debug!(instance_id, "Primary load balancer created");

        if !spec.is_high_availability() {
            return Ok(());
        }

        // 4. Pooler and its load balancer
        let pooler = self
            .manifests
            .pooler(instance_id, spec.instances)
            .map_err(render_error)?;
        self.platform
            .create_custom(CustomKind::Pooler, namespace, &pooler)
            .await?;
        debug!(instance_id, "Pooler created");

        let selector = BTreeMap::from([("cnpg.io/poolerName", names::pooler(instance_id))]);
        let service = self
            .manifests
            .load_balancer(
                instance_id,
                &names::pooler_lb_service(instance_id),
                POOLER_PORT,
                &selector,
            )
            .map_err(render_error)?;
        self.platform.create_service(namespace, &service).await?;
        debug!(instance_id, "Pooler load balancer created");

        Ok(())
    }

    /// Best-effort removal of a partial deployment
    async fn cleanup_on_failure(&self, instance_id: &str) {
        warn!(instance_id, "Rolling back partial deployment");
        match self.platform.delete_namespace(names::namespace(instance_id)).await {
            Ok(()) => info!(instance_id, "Partial deployment removed"),
            Err(err) => warn!(instance_id, error = %err, "Rollback failed, resources left behind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{adapter, rollback_adapter, DEV_SMALL, HA_SMALL, INSTANCE_ID};
    use crate::mock::MockPlatform;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_instance_plan_creates_no_pooler() {
        let platform = Arc::new(MockPlatform::new());
        adapter(&platform).create_cluster(INSTANCE_ID, DEV_SMALL).await.unwrap();

        assert_eq!(
            platform.calls(),
            vec![
                format!("create_namespace {}", INSTANCE_ID),
                format!("create_custom Cluster/{}", INSTANCE_ID),
                format!("create_service {}-lb-rw", INSTANCE_ID),
            ]
        );
        assert_eq!(platform.service_count(INSTANCE_ID), 1);
        assert!(platform
            .custom(CustomKind::Pooler, INSTANCE_ID, &names::pooler(INSTANCE_ID))
            .is_none());
    }

    #[tokio::test]
    async fn test_ha_plan_creates_pooler_and_second_service() {
        let platform = Arc::new(MockPlatform::new());
        adapter(&platform).create_cluster(INSTANCE_ID, HA_SMALL).await.unwrap();

        assert_eq!(platform.service_count(INSTANCE_ID), 2);
        let pooler = platform
            .custom(CustomKind::Pooler, INSTANCE_ID, &names::pooler(INSTANCE_ID))
            .unwrap();
        assert_eq!(pooler.data["spec"]["instances"], 3);

        let svc = platform
            .service(INSTANCE_ID, &names::pooler_lb_service(INSTANCE_ID))
            .unwrap();
        let spec = svc.spec.unwrap();
        assert_eq!(spec.ports.unwrap()[0].port, 6432);
        assert_eq!(
            spec.selector.unwrap()["cnpg.io/poolerName"],
            format!("{}-pooler", INSTANCE_ID)
        );
    }

    #[tokio::test]
    async fn test_cluster_gets_plan_resources() {
        let platform = Arc::new(MockPlatform::new());
        adapter(&platform).create_cluster(INSTANCE_ID, DEV_SMALL).await.unwrap();

        let cluster = platform
            .custom(CustomKind::Cluster, INSTANCE_ID, INSTANCE_ID)
            .unwrap();
        assert_eq!(cluster.data["spec"]["instances"], 1);
        assert_eq!(cluster.data["spec"]["resources"]["limits"]["cpu"], "500m");
        assert_eq!(cluster.data["spec"]["storage"]["size"], "10Gi");
    }

    #[tokio::test]
    async fn test_existing_namespace_reports_already_exists() {
        let platform = Arc::new(MockPlatform::new());
        platform.insert_namespace(INSTANCE_ID);

        let err = adapter(&platform)
            .create_cluster(INSTANCE_ID, DEV_SMALL)
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        // nothing else attempted, nothing rolled back
        assert_eq!(platform.calls().len(), 1);
        assert!(platform.has_namespace(INSTANCE_ID));
    }

    #[tokio::test]
    async fn test_later_already_exists_is_not_reported_as_race() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_on(
            "create_service",
            PlatformError::AlreadyExists("services exists".to_string()),
        );

        let err = adapter(&platform)
            .create_cluster(INSTANCE_ID, DEV_SMALL)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Other(_)));
    }

    #[tokio::test]
    async fn test_mid_sequence_failure_rolls_back_namespace() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_on("create_custom:Pooler", PlatformError::Other("quota".to_string()));

        let err = rollback_adapter(&platform)
            .create_cluster(INSTANCE_ID, HA_SMALL)
            .await
            .unwrap_err();
        assert_eq!(err, PlatformError::Other("quota".to_string()));
        assert!(!platform.has_namespace(INSTANCE_ID));
        assert_eq!(
            platform.calls().last().unwrap(),
            &format!("delete_namespace {}", INSTANCE_ID)
        );
    }

    #[tokio::test]
    async fn test_mid_sequence_failure_leaves_resources_by_default() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_on("create_custom:Pooler", PlatformError::Other("quota".to_string()));

        assert!(adapter(&platform).create_cluster(INSTANCE_ID, HA_SMALL).await.is_err());

        assert!(!platform.calls().iter().any(|c| c.starts_with("delete_namespace")));
        assert!(platform.has_namespace(INSTANCE_ID));
        assert!(platform.custom(CustomKind::Cluster, INSTANCE_ID, INSTANCE_ID).is_some());
        // pooler load balancer never attempted
        assert_eq!(platform.service_count(INSTANCE_ID), 1);
    }

    #[tokio::test]
    async fn test_failed_rollback_returns_original_error() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_on("create_custom", PlatformError::Other("webhook denied".to_string()));
        platform.fail_on("delete_namespace", PlatformError::Other("forbidden".to_string()));

        let err = rollback_adapter(&platform)
            .create_cluster(INSTANCE_ID, DEV_SMALL)
            .await
            .unwrap_err();
        assert_eq!(err, PlatformError::Other("webhook denied".to_string()));
    }
}
