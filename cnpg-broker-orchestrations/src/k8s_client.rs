//! Kubernetes implementation of the resource platform

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret, Service};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::Client;

use crate::platform::{CustomKind, PlatformResult, ResourcePlatform};

/// Get a Kubernetes client (in-cluster config, falling back to kubeconfig)
pub async fn get_k8s_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}

/// [`ResourcePlatform`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct K8sPlatform {
    client: Client,
}

impl K8sPlatform {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the default client configuration
    pub async fn connect() -> Result<Self> {
        Ok(Self::new(get_k8s_client().await?))
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    fn custom(&self, kind: CustomKind, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &kind.api_resource())
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ResourcePlatform for K8sPlatform {
    async fn create_namespace(&self, namespace: &Namespace) -> PlatformResult<()> {
        self.namespaces()
            .create(&PostParams::default(), namespace)
            .await?;
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> PlatformResult<()> {
        self.namespaces()
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn create_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        object: &DynamicObject,
    ) -> PlatformResult<()> {
        self.custom(kind, namespace)
            .create(&PostParams::default(), object)
            .await?;
        Ok(())
    }

    async fn get_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
    ) -> PlatformResult<DynamicObject> {
        Ok(self.custom(kind, namespace).get(name).await?)
    }

    async fn patch_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> PlatformResult<()> {
        self.custom(kind, namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> PlatformResult<()> {
        self.services(namespace)
            .create(&PostParams::default(), service)
            .await?;
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> PlatformResult<Service> {
        Ok(self.services(namespace).get(name).await?)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> PlatformResult<Secret> {
        Ok(self.secrets(namespace).get(name).await?)
    }

    async fn ping(&self) -> PlatformResult<()> {
        let clusters: Api<DynamicObject> =
            Api::all_with(self.client.clone(), &CustomKind::Cluster.api_resource());
        clusters.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }
}
