//! Resource platform boundary
//!
//! [`ResourcePlatform`] is the set of primitive Kubernetes operations the
//! cluster adapter is built from. Failures come back as a [`PlatformError`]
//! tagged with the condition the caller dispatches on, classified from the API
//! status rather than from message text.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret, Service};
use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The resource is already there (create-if-absent lost)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure, surfaced as an internal error
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, PlatformError::AlreadyExists(_))
    }
}

impl From<kube::Error> for PlatformError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) if response.reason == "AlreadyExists" => {
                PlatformError::AlreadyExists(response.message)
            }
            kube::Error::Api(response) if response.code == 404 => {
                PlatformError::NotFound(response.message)
            }
            other => PlatformError::Other(other.to_string()),
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// CloudNativePG custom resources managed by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomKind {
    Cluster,
    Pooler,
}

impl CustomKind {
    pub const GROUP: &'static str = "postgresql.cnpg.io";
    pub const VERSION: &'static str = "v1";

    pub fn kind(&self) -> &'static str {
        match self {
            CustomKind::Cluster => "Cluster",
            CustomKind::Pooler => "Pooler",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            CustomKind::Cluster => "clusters",
            CustomKind::Pooler => "poolers",
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: Self::GROUP.to_string(),
            version: Self::VERSION.to_string(),
            api_version: format!("{}/{}", Self::GROUP, Self::VERSION),
            kind: self.kind().to_string(),
            plural: self.plural().to_string(),
        }
    }
}

/// Primitive operations against the resource platform
#[async_trait]
pub trait ResourcePlatform: Send + Sync {
    /// Create a namespace; fails with `AlreadyExists` if it is already there
    async fn create_namespace(&self, namespace: &Namespace) -> PlatformResult<()>;

    /// Delete a namespace and, by cascade, everything in it
    async fn delete_namespace(&self, name: &str) -> PlatformResult<()>;

    async fn create_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        object: &DynamicObject,
    ) -> PlatformResult<()>;

    async fn get_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
    ) -> PlatformResult<DynamicObject>;

    /// Apply a JSON merge patch to a custom resource
    async fn patch_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> PlatformResult<()>;

    async fn create_service(&self, namespace: &str, service: &Service) -> PlatformResult<()>;

    async fn get_service(&self, namespace: &str, name: &str) -> PlatformResult<Service>;

    async fn get_secret(&self, namespace: &str, name: &str) -> PlatformResult<Secret>;

    /// Cheap read proving the platform (and the Cluster CRD) is reachable
    async fn ping(&self) -> PlatformResult<()>;
}
