//! CNPG Broker Orchestrations - instance lifecycle for CloudNativePG clusters
//!
//! This crate turns service broker calls (provision, update, deprovision,
//! bind) into operations on CloudNativePG `Cluster`/`Pooler` resources and the
//! Kubernetes objects around them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cnpg_broker_orchestrations::{Catalog, ClusterAdapter, InstanceOrchestrator, K8sPlatform};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = Arc::new(Catalog::default());
//! let platform = Arc::new(K8sPlatform::connect().await?);
//! let clusters = ClusterAdapter::new(platform, catalog.clone())?;
//! let orchestrator = InstanceOrchestrator::new(catalog, clusters);
//!
//! orchestrator
//!     .provision_instance(
//!         "5f0c6c5e-2b3a-4f4e-9d1a-0c1b2d3e4f5a",
//!         "79f7fb16-c95d-4210-8930-1c758648327e",
//!         "22cedd15-900f-4625-9f10-a57f43c64585",
//!         None,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod names;
pub mod quantity;
pub mod types;
pub mod validation;

// Platform boundary
pub mod k8s_client;
pub mod platform;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub mod cluster;
pub mod orchestrations;

// Re-export key types for convenience
pub use catalog::{Catalog, CatalogError};
pub use cluster::{AdapterOptions, ClusterAdapter};
pub use k8s_client::K8sPlatform;
pub use orchestrations::{BrokerError, BrokerResult, InstanceOrchestrator, ProvisionOutcome};
pub use platform::{PlatformError, ResourcePlatform};
pub use types::*;
pub use validation::{ValidationError, Validator};
