use serde_json::Value;
use tracing::{debug, info, warn};

use super::{BrokerError, BrokerResult, InstanceOrchestrator};

/// How a provision request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Resources were created by this call
    Created,
    /// An instance with the same spec already existed (retry or lost race)
    AlreadyProvisioned,
}

impl InstanceOrchestrator {
    pub async fn provision_instance(
        &self,
        instance_id: &str,
        service_id: &str,
        plan_id: &str,
        context: Option<&Value>,
    ) -> BrokerResult<ProvisionOutcome> {
        self.validator.validate_instance_id(instance_id)?;
        self.validator.validate_service_id(service_id)?;
        self.validator.validate_plan_id(service_id, plan_id)?;

        info!(instance_id, service_id, plan_id, "Provisioning instance");
        if let Some(context) = context {
            debug!(instance_id, %context, "Platform context");
        }

        if let Some(existing) = self.find_cluster(instance_id).await? {
            let requested = self.catalog.plan_spec(plan_id);
            if existing.spec == requested {
                info!(instance_id, "Instance already provisioned with this plan");
                return Ok(ProvisionOutcome::AlreadyProvisioned);
            }

            warn!(
                instance_id,
                plan_id,
                existing = ?existing.spec,
                "Instance exists with a different spec"
            );
            return Err(BrokerError::Conflict(format!(
                "instance {} already exists with a different plan",
                instance_id
            )));
        }

        match self.clusters.create_cluster(instance_id, plan_id).await {
            Ok(()) => Ok(ProvisionOutcome::Created),
            Err(err) if err.is_already_exists() => {
                info!(instance_id, "Instance created concurrently, treating as provisioned");
                Ok(ProvisionOutcome::AlreadyProvisioned)
            }
            Err(err) => Err(err.into()),
        }
    }
}
