use tracing::info;

use super::{BrokerError, BrokerResult, InstanceOrchestrator};

impl InstanceOrchestrator {
    /// Delete an instance and everything in its namespace.
    ///
    /// Existence is the namespace, not the Cluster, so a deployment that
    /// failed part way through can still be removed.
    pub async fn deprovision_instance(&self, instance_id: &str) -> BrokerResult<()> {
        self.validator.validate_instance_id(instance_id)?;

        match self.clusters.delete_cluster(instance_id).await {
            Ok(()) => {
                info!(instance_id, "Instance deprovisioned");
                Ok(())
            }
            Err(err) if err.is_not_found() => Err(BrokerError::NotFound(format!(
                "instance {} not found",
                instance_id
            ))),
            Err(err) => Err(err.into()),
        }
    }
}
