use cnpg_broker_models::Credentials;
use tracing::info;

use super::{BrokerResult, InstanceOrchestrator};

// Bindings are not stored anywhere: credentials are read from the instance on
// every call and the binding id is only validated.
impl InstanceOrchestrator {
    pub async fn bind_instance(
        &self,
        instance_id: &str,
        binding_id: &str,
    ) -> BrokerResult<Credentials> {
        self.validator.validate_instance_id(instance_id)?;
        self.validator.validate_binding_id(binding_id)?;
        self.require_cluster(instance_id).await?;

        let credentials = self.clusters.get_credentials(instance_id).await?;
        info!(instance_id, binding_id, "Binding created");
        Ok(credentials)
    }

    pub async fn get_binding(
        &self,
        instance_id: &str,
        binding_id: &str,
    ) -> BrokerResult<Credentials> {
        self.validator.validate_instance_id(instance_id)?;
        self.validator.validate_binding_id(binding_id)?;
        Ok(self.clusters.get_credentials(instance_id).await?)
    }

    pub async fn unbind_instance(&self, instance_id: &str, binding_id: &str) -> BrokerResult<()> {
        self.validator.validate_instance_id(instance_id)?;
        self.validator.validate_binding_id(binding_id)?;
        info!(instance_id, binding_id, "Binding removed");
        Ok(())
    }
}
