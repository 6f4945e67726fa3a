//! Resource orchestration adapter
//!
//! [`ClusterAdapter`] turns instance-level intents (create, read, update,
//! delete, fetch credentials) into ordered operations on a
//! [`ResourcePlatform`]. It holds no state of its own: everything it returns is
//! read live from the platform.

mod create_cluster;
mod delete_cluster;
mod get_cluster;
mod get_credentials;
mod manifests;
mod update_cluster;

pub use manifests::Manifests;

use anyhow::Result;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::platform::{PlatformError, PlatformResult, ResourcePlatform};

#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterOptions {
    /// Delete the namespace again when a later creation step fails.
    /// Off by default; deprovision removes a partial deployment.
    pub rollback_on_failure: bool,
}

pub struct ClusterAdapter {
    platform: Arc<dyn ResourcePlatform>,
    catalog: Arc<Catalog>,
    manifests: Manifests,
    options: AdapterOptions,
}

impl ClusterAdapter {
    pub fn new(platform: Arc<dyn ResourcePlatform>, catalog: Arc<Catalog>) -> Result<Self> {
        Ok(Self {
            platform,
            catalog,
            manifests: Manifests::new()?,
            options: AdapterOptions::default(),
        })
    }

    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    /// Check that the platform is reachable
    pub async fn ping(&self) -> PlatformResult<()> {
        self.platform.ping().await
    }
}

/// Manifest rendering failures surface as platform errors
fn render_error(err: anyhow::Error) -> PlatformError {
    PlatformError::Other(format!("{:#}", err))
}
