//! In-memory [`ResourcePlatform`] for tests
//!
//! Namespaces are created atomically (create-if-absent under one lock) and
//! deleting a namespace drops everything inside it, like the real cascade.
//! Every call is recorded, and any operation can be made to fail.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Namespace, Secret, Service, ServiceStatus,
};
use k8s_openapi::ByteString;
use kube::api::DynamicObject;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::platform::{CustomKind, PlatformError, PlatformResult, ResourcePlatform};

#[derive(Default)]
struct MockNamespace {
    customs: HashMap<(CustomKind, String), DynamicObject>,
    services: HashMap<String, Service>,
    secrets: HashMap<String, Secret>,
}

#[derive(Default)]
struct State {
    namespaces: HashMap<String, MockNamespace>,
    calls: Vec<String>,
    failures: HashMap<String, PlatformError>,
}

#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<State>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail with `error`.
    ///
    /// Operations are named after the trait methods, optionally qualified by
    /// the target: `create_custom:Pooler`, `get_secret:<name>`,
    /// `create_service:<name>`, `get_service:<name>`.
    pub fn fail_on(&self, operation: &str, error: PlatformError) {
        self.state.lock().failures.insert(operation.to_string(), error);
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn namespace_count(&self) -> usize {
        self.state.lock().namespaces.len()
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.state.lock().namespaces.contains_key(name)
    }

    /// Create a bare namespace, as a concurrent provisioner would have
    pub fn insert_namespace(&self, name: &str) {
        self.state.lock().namespaces.entry(name.to_string()).or_default();
    }

    pub fn custom(&self, kind: CustomKind, namespace: &str, name: &str) -> Option<DynamicObject> {
        self.state
            .lock()
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.customs.get(&(kind, name.to_string())).cloned())
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.state
            .lock()
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.services.get(name).cloned())
    }

    pub fn service_count(&self, namespace: &str) -> usize {
        self.state
            .lock()
            .namespaces
            .get(namespace)
            .map_or(0, |ns| ns.services.len())
    }

    /// Write the status sub-document the operator would report
    pub fn set_cluster_status(&self, instance_id: &str, phase: &str, instances: i64, ready: i64) {
        let mut state = self.state.lock();
        let cluster = state
            .namespaces
            .get_mut(instance_id)
            .and_then(|ns| ns.customs.get_mut(&(CustomKind::Cluster, instance_id.to_string())));
        if let Some(cluster) = cluster {
            cluster.data["status"] = serde_json::json!({
                "phase": phase,
                "instances": instances,
                "readyInstances": ready,
            });
        }
    }

    /// Store a secret; creates the namespace if needed
    pub fn insert_secret(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let mut secret = Secret::default();
        secret.metadata.name = Some(name.to_string());
        secret.metadata.namespace = Some(namespace.to_string());
        secret.data = Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect::<BTreeMap<_, _>>(),
        );

        self.state
            .lock()
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .secrets
            .insert(name.to_string(), secret);
    }

    pub fn remove_secret(&self, namespace: &str, name: &str) {
        if let Some(ns) = self.state.lock().namespaces.get_mut(namespace) {
            ns.secrets.remove(name);
        }
    }

    /// Assign (or clear, with both `None`) a service's load balancer address
    pub fn set_load_balancer(
        &self,
        namespace: &str,
        service: &str,
        ip: Option<&str>,
        hostname: Option<&str>,
    ) {
        let mut state = self.state.lock();
        let Some(svc) = state
            .namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.services.get_mut(service))
        else {
            return;
        };

        let ingress = if ip.is_none() && hostname.is_none() {
            Vec::new()
        } else {
            vec![LoadBalancerIngress {
                ip: ip.map(str::to_string),
                hostname: hostname.map(str::to_string),
                ..Default::default()
            }]
        };

        svc.status = Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus { ingress: Some(ingress) }),
            ..Default::default()
        });
    }

    fn record(&self, call: String) -> PlatformResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call.clone());

        let (operation, target) = call.split_once(' ').unwrap_or((call.as_str(), ""));
        let mut keys = vec![operation.to_string()];
        if !target.is_empty() {
            keys.push(format!("{}:{}", operation, target));
            if let Some((kind, name)) = target.split_once('/') {
                keys.push(format!("{}:{}", operation, kind));
                keys.push(format!("{}:{}", operation, name));
            }
        }

        match keys.iter().rev().find_map(|key| state.failures.get(key)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn missing_namespace(namespace: &str) -> PlatformError {
    PlatformError::NotFound(format!("namespaces \"{}\" not found", namespace))
}

/// RFC 7386 JSON merge patch
fn merge_patch(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(Default::default());
            }
            if let Value::Object(target) = target {
                for (key, value) in entries {
                    if value.is_null() {
                        target.remove(key);
                    } else {
                        merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
                    }
                }
            }
        }
        other => *target = other.clone(),
    }
}

#[async_trait]
impl ResourcePlatform for MockPlatform {
    async fn create_namespace(&self, namespace: &Namespace) -> PlatformResult<()> {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        self.record(format!("create_namespace {}", name))?;

        let mut state = self.state.lock();
        if state.namespaces.contains_key(&name) {
            return Err(PlatformError::AlreadyExists(format!(
                "namespaces \"{}\" already exists",
                name
            )));
        }
        state.namespaces.insert(name, MockNamespace::default());
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> PlatformResult<()> {
        self.record(format!("delete_namespace {}", name))?;
        match self.state.lock().namespaces.remove(name) {
            Some(_) => Ok(()),
            None => Err(missing_namespace(name)),
        }
    }

    async fn create_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        object: &DynamicObject,
    ) -> PlatformResult<()> {
        let name = object.metadata.name.clone().unwrap_or_default();
        self.record(format!("create_custom {}/{}", kind.kind(), name))?;

        let mut state = self.state.lock();
        let ns = state
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        let key = (kind, name);
        if ns.customs.contains_key(&key) {
            return Err(PlatformError::AlreadyExists(format!("{} already exists", key.1)));
        }
        ns.customs.insert(key, object.clone());
        Ok(())
    }

    async fn get_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
    ) -> PlatformResult<DynamicObject> {
        self.record(format!("get_custom {}/{}", kind.kind(), name))?;
        self.custom(kind, namespace, name).ok_or_else(|| {
            PlatformError::NotFound(format!("{} \"{}\" not found", kind.plural(), name))
        })
    }

    async fn patch_custom(
        &self,
        kind: CustomKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> PlatformResult<()> {
        self.record(format!("patch_custom {}/{}", kind.kind(), name))?;

        let mut state = self.state.lock();
        let object = state
            .namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.customs.get_mut(&(kind, name.to_string())))
            .ok_or_else(|| {
                PlatformError::NotFound(format!("{} \"{}\" not found", kind.plural(), name))
            })?;
        merge_patch(&mut object.data, patch);
        Ok(())
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> PlatformResult<()> {
        let name = service.metadata.name.clone().unwrap_or_default();
        self.record(format!("create_service {}", name))?;

        let mut state = self.state.lock();
        let ns = state
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        if ns.services.contains_key(&name) {
            return Err(PlatformError::AlreadyExists(format!(
                "services \"{}\" already exists",
                name
            )));
        }
        ns.services.insert(name, service.clone());
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> PlatformResult<Service> {
        self.record(format!("get_service {}", name))?;
        self.service(namespace, name)
            .ok_or_else(|| PlatformError::NotFound(format!("services \"{}\" not found", name)))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> PlatformResult<Secret> {
        self.record(format!("get_secret {}", name))?;
        self.state
            .lock()
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.secrets.get(name).cloned())
            .ok_or_else(|| PlatformError::NotFound(format!("secrets \"{}\" not found", name)))
    }

    async fn ping(&self) -> PlatformResult<()> {
        self.record("ping".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_replaces_and_removes() {
        let mut target = json!({"spec": {"instances": 1, "storage": {"size": "10Gi"}}, "status": {"phase": "ok"}});
        merge_patch(
            &mut target,
            &json!({"spec": {"instances": 3, "storage": {"size": "50Gi"}}, "status": null}),
        );
        assert_eq!(target, json!({"spec": {"instances": 3, "storage": {"size": "50Gi"}}}));
    }

    #[tokio::test]
    async fn test_namespace_create_is_exclusive() {
        let platform = MockPlatform::new();
        let mut ns = Namespace::default();
        ns.metadata.name = Some("db".to_string());

        platform.create_namespace(&ns).await.unwrap();
        let err = platform.create_namespace(&ns).await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(platform.namespace_count(), 1);
    }

    #[tokio::test]
    async fn test_qualified_failure_injection() {
        let platform = MockPlatform::new();
        platform.insert_secret("db", "db-app", &[("host", "db-rw")]);
        platform.insert_secret("db", "db-ca", &[("ca.crt", "CA")]);
        platform.fail_on("get_secret:db-ca", PlatformError::Other("boom".to_string()));

        assert!(platform.get_secret("db", "db-app").await.is_ok());
        assert_eq!(
            platform.get_secret("db", "db-ca").await.unwrap_err(),
            PlatformError::Other("boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_namespace_cascades() {
        let platform = MockPlatform::new();
        platform.insert_secret("db", "db-app", &[("host", "db-rw")]);
        platform.delete_namespace("db").await.unwrap();

        assert!(!platform.has_namespace("db"));
        assert!(platform.get_secret("db", "db-app").await.unwrap_err().is_not_found());
        assert!(platform.delete_namespace("db").await.unwrap_err().is_not_found());
    }
}
