use anyhow::{Context, Result};
use cnpg_broker_orchestrations::{
    AdapterOptions, Catalog, ClusterAdapter, InstanceOrchestrator, K8sPlatform,
};
use std::sync::Arc;

use crate::api::{self, AppState};
use crate::auth::BasicAuth;
use crate::config::Config;
use crate::metrics::BrokerMetrics;

/// Load the catalog, connect to Kubernetes and serve the broker API
pub async fn run_serve(config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    tracing::info!("Starting CNPG broker");
    tracing::info!("API port: {}", port);

    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!("Loading catalog from {}", path.display());
            Catalog::load(path).context("Failed to load catalog")?
        }
        None => Catalog::default(),
    };
    let catalog = Arc::new(catalog);
    tracing::info!(services = catalog.services().len(), "Catalog ready");

    let platform = Arc::new(K8sPlatform::connect().await?);
    let clusters = ClusterAdapter::new(platform, catalog.clone())
        .context("Failed to load manifest templates")?
        .with_options(AdapterOptions {
            rollback_on_failure: config.rollback_on_failure,
        });
    let orchestrator = Arc::new(InstanceOrchestrator::new(catalog, clusters));

    if let Err(e) = orchestrator.health().await {
        tracing::warn!("Kubernetes not reachable yet: {}", e);
    }

    let auth = config
        .credentials()
        .map(|(username, password)| Arc::new(BasicAuth::new(username, password)));
    if auth.is_none() {
        tracing::warn!("BROKER_USERNAME/BROKER_PASSWORD not set; API is unauthenticated");
    }

    let metrics = Arc::new(BrokerMetrics::new().context("Failed to register metrics")?);

    api::start_server(port, AppState { orchestrator, auth, metrics }).await
}
