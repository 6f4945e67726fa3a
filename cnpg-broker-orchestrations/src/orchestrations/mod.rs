//! Instance lifecycle orchestrator
//!
//! [`InstanceOrchestrator`] applies the broker's lifecycle rules on top of the
//! [`ClusterAdapter`]: input validation, idempotent provisioning, plan
//! compatibility and monotonic updates. Each call completes within the
//! request; state transitions after creation belong to the operator, so
//! nothing here polls or waits.

mod bind_instance;
mod deprovision_instance;
mod get_instance;
mod provision_instance;
mod update_instance;

pub use provision_instance::ProvisionOutcome;

use std::sync::Arc;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::cluster::ClusterAdapter;
use crate::platform::{PlatformError, PlatformResult};
use crate::types::ClusterInfo;
use crate::validation::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    /// Instance exists with a spec different from the requested plan
    #[error("{0}")]
    Conflict(String),

    /// Request is well formed but the change is not allowed
    #[error("{0}")]
    Unprocessable(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

pub type BrokerResult<T> = Result<T, BrokerError>;

pub struct InstanceOrchestrator {
    validator: Validator,
    catalog: Arc<Catalog>,
    clusters: ClusterAdapter,
}

impl InstanceOrchestrator {
    pub fn new(catalog: Arc<Catalog>, clusters: ClusterAdapter) -> Self {
        Self {
            validator: Validator::new(catalog.clone()),
            catalog,
            clusters,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Platform connectivity check
    pub async fn health(&self) -> PlatformResult<()> {
        self.clusters.ping().await
    }

    /// Current cluster state, or `None` when the instance doesn't exist
    async fn find_cluster(&self, instance_id: &str) -> BrokerResult<Option<ClusterInfo>> {
        match self.clusters.get_cluster(instance_id).await {
            Ok(info) => Ok(Some(info)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn require_cluster(&self, instance_id: &str) -> BrokerResult<ClusterInfo> {
        self.find_cluster(instance_id)
            .await?
            .ok_or_else(|| BrokerError::NotFound(format!("instance {} not found", instance_id)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cluster::testing::adapter;
    use crate::mock::MockPlatform;

    pub use crate::cluster::testing::{DEV_SMALL, HA_SMALL, INSTANCE_ID};

    pub const BINDING_ID: &str = "0b1c2d3e-4f50-4a1b-8c2d-3e4f5a6b7c8d";
    pub const DEV_SERVICE: &str = "79f7fb16-c95d-4210-8930-1c758648327e";
    pub const DEV_MEDIUM: &str = "de7acc66-412d-41c0-bf3e-763307a86c38";
    pub const DEV_LARGE: &str = "bfefc341-29a1-48e5-a6be-690f44aabbb3";
    pub const HA_SERVICE: &str = "a651d10f-25ab-4a75-99a6-520c0abbe2ae";
    pub const HA_MEDIUM: &str = "31aaeae1-4716-4631-b43e-93144e689427";

    pub fn orchestrator(platform: &Arc<MockPlatform>) -> InstanceOrchestrator {
        InstanceOrchestrator::new(Arc::new(Catalog::default()), adapter(platform))
    }
}
