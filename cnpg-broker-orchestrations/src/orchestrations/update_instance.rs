use tracing::info;

use super::{BrokerError, BrokerResult, InstanceOrchestrator};
use crate::quantity::parse_quantity;
use crate::validation::ValidationError;

impl InstanceOrchestrator {
    /// Move an instance to another plan.
    ///
    /// Instance count and storage may only grow; CPU and memory may change
    /// either way.
    pub async fn update_instance(
        &self,
        instance_id: &str,
        service_id: &str,
        plan_id: Option<&str>,
    ) -> BrokerResult<()> {
        self.validator.validate_instance_id(instance_id)?;
        self.validator.validate_service_id(service_id)?;
        let plan_id = plan_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::new("plan_id", "required"))?;
        self.validator.validate_plan_id(service_id, plan_id)?;

        let current = self.require_cluster(instance_id).await?.spec;
        let requested = self.catalog.plan_spec(plan_id);

        if requested.instances < current.instances {
            return Err(BrokerError::Unprocessable(format!(
                "cannot decrease instances from {} to {}",
                current.instances, requested.instances
            )));
        }
        if parse_quantity(&requested.storage) < parse_quantity(&current.storage) {
            return Err(BrokerError::Unprocessable(format!(
                "cannot decrease storage from {} to {}",
                current.storage, requested.storage
            )));
        }

        self.clusters
            .update_cluster(instance_id, &current, &requested)
            .await?;
        info!(instance_id, plan_id, "Instance updated");
        Ok(())
    }
}
