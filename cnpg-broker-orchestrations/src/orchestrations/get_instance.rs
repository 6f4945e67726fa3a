use cnpg_broker_models::{InstanceResponse, InstanceStatus};

use super::{BrokerResult, InstanceOrchestrator};

impl InstanceOrchestrator {
    /// Live status of an instance, with readiness collapsed to a coarse status
    pub async fn get_instance(&self, instance_id: &str) -> BrokerResult<InstanceResponse> {
        self.validator.validate_instance_id(instance_id)?;
        let info = self.require_cluster(instance_id).await?;

        Ok(InstanceResponse {
            status: InstanceStatus::from_counts(info.ready_instances, info.instances),
            instance_id: info.instance_id,
            namespace: info.namespace,
            phase: info.phase,
            instances: info.instances,
            ready_instances: info.ready_instances,
            labels: info.labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;
    use crate::orchestrations::testing::*;
    use crate::orchestrations::BrokerError;
    use crate::platform::PlatformError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_follows_ready_counts() {
        let platform = Arc::new(MockPlatform::new());
        let orchestrator = orchestrator(&platform);
        orchestrator
            .provision_instance(INSTANCE_ID, HA_SERVICE, HA_MEDIUM, None)
            .await
            .unwrap();

        // operator hasn't reported yet
        let response = orchestrator.get_instance(INSTANCE_ID).await.unwrap();
        assert_eq!(response.status, InstanceStatus::NotReady);
        assert_eq!(response.instances, 0);

        platform.set_cluster_status(INSTANCE_ID, "Creating replica", 3, 1);
        let response = orchestrator.get_instance(INSTANCE_ID).await.unwrap();
        assert_eq!(response.status, InstanceStatus::PartiallyReady);
        assert_eq!(response.phase, "Creating replica");

        platform.set_cluster_status(INSTANCE_ID, "Cluster in healthy state", 3, 3);
        let response = orchestrator.get_instance(INSTANCE_ID).await.unwrap();
        assert_eq!(response.status, InstanceStatus::Ready);
        assert_eq!(response.namespace, INSTANCE_ID);
        assert_eq!(response.labels["cnpg-broker/plan-id"], HA_MEDIUM);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_not_found() {
        let platform = Arc::new(MockPlatform::new());
        let err = orchestrator(&platform).get_instance(INSTANCE_ID).await.unwrap_err();
        assert!(matches!(err, BrokerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_platform_failure_is_internal() {
        let platform = Arc::new(MockPlatform::new());
        platform.fail_on("get_custom", PlatformError::Other("unauthorized".to_string()));
        let err = orchestrator(&platform).get_instance(INSTANCE_ID).await.unwrap_err();
        assert!(matches!(err, BrokerError::Platform(_)));
    }
}
