//! Name conventions for the Kubernetes resources of a service instance
//!
//! Every resource lives in a namespace named after the instance id. The
//! secret names follow what the CloudNativePG operator generates for a
//! cluster; the service and pooler names are ours.

/// PostgreSQL port exposed by the primary and read-only endpoints
pub const POSTGRES_PORT: u16 = 5432;

/// Port exposed by the pooler load balancer
pub const POOLER_PORT: u16 = 6432;

/// Namespace (isolation boundary) of an instance
pub fn namespace(instance_id: &str) -> &str {
    instance_id
}

/// Name of the `Cluster` resource
pub fn cluster(instance_id: &str) -> &str {
    instance_id
}

/// Application credentials secret generated by the operator
pub fn app_secret(instance_id: &str) -> String {
    format!("{}-app", instance_id)
}

/// CA certificate secret
pub fn ca_secret(instance_id: &str) -> String {
    format!("{}-ca", instance_id)
}

/// Server TLS secret
pub fn server_secret(instance_id: &str) -> String {
    format!("{}-server", instance_id)
}

/// Pooler resource, also the name of its TLS secret
pub fn pooler(instance_id: &str) -> String {
    format!("{}-pooler", instance_id)
}

/// Read-only service host
pub fn ro_host(instance_id: &str) -> String {
    format!("{}-ro", instance_id)
}

/// Cluster-internal FQDN of the read-only service
pub fn ro_fqdn(instance_id: &str) -> String {
    format!("{}-ro.{}.svc.cluster.local", instance_id, namespace(instance_id))
}

/// Load balancer in front of the primary
pub fn primary_lb_service(instance_id: &str) -> String {
    format!("{}-lb-rw", instance_id)
}

/// Load balancer in front of the pooler
pub fn pooler_lb_service(instance_id: &str) -> String {
    format!("{}-lb-pooler", instance_id)
}
