use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Coarse readiness of a service instance, derived from the cluster's
/// ready/total instance counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Ready,
    PartiallyReady,
    NotReady,
}

impl InstanceStatus {
    /// `ready` when every instance is ready, `partially_ready` when some are,
    /// `not_ready` otherwise (including an empty cluster)
    pub fn from_counts(ready: i64, total: i64) -> Self {
        if total > 0 && ready == total {
            InstanceStatus::Ready
        } else if ready > 0 && ready < total {
            InstanceStatus::PartiallyReady
        } else {
            InstanceStatus::NotReady
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Ready => "ready",
            InstanceStatus::PartiallyReady => "partially_ready",
            InstanceStatus::NotReady => "not_ready",
        }
    }
}

/// Connection credentials handed out by a binding.
///
/// The base fields come from the cluster's application secret and are always
/// present. Every optional group appears only when the platform artifact it is
/// derived from existed at read time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub uri: String,
    pub jdbc_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ro_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ro_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ro_jdbc_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_jdbc_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooler_jdbc_uri: Option<String>,
}

// ============================================================================
// Broker requests
// ============================================================================

/// Body of `PUT /v2/service_instances/{instance_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub service_id: String,
    pub plan_id: String,
    /// Platform context (organization, space, namespace...), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Body of `PATCH /v2/service_instances/{instance_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub service_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<Value>,
}

/// Body of `PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
///
/// Bindings are derived from live credentials, so the body is accepted but
/// nothing in it changes the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindRequest {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

// ============================================================================
// Broker responses
// ============================================================================

/// Response from provisioning an instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionResponse {
    pub instance_id: String,
}

/// Response from fetching an instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceResponse {
    pub instance_id: String,
    pub namespace: String,
    pub status: InstanceStatus,
    pub phase: String,
    pub instances: i64,
    pub ready_instances: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Response from creating or fetching a binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingResponse {
    pub credentials: Credentials,
}

/// Empty JSON object, returned by deprovision/update/unbind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmptyResponse {}

/// Error body returned for every failed broker call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_status_from_counts() {
        assert_eq!(InstanceStatus::from_counts(3, 3), InstanceStatus::Ready);
        assert_eq!(InstanceStatus::from_counts(1, 3), InstanceStatus::PartiallyReady);
        assert_eq!(InstanceStatus::from_counts(0, 3), InstanceStatus::NotReady);
        assert_eq!(InstanceStatus::from_counts(0, 0), InstanceStatus::NotReady);
    }

    #[test]
    fn test_instance_status_serializes_snake_case() {
        let json = serde_json::to_string(&InstanceStatus::PartiallyReady).unwrap();
        assert_eq!(json, "\"partially_ready\"");
        assert_eq!(InstanceStatus::PartiallyReady.as_str(), "partially_ready");
    }

    #[test]
    fn test_credentials_omit_absent_optional_keys() {
        let creds = Credentials {
            host: "db-rw".to_string(),
            port: "5432".to_string(),
            ro_host: Some("db-ro".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&creds).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["host"], "db-rw");
        assert_eq!(object["ro_host"], "db-ro");
        assert!(!object.contains_key("lb_host"));
        assert!(!object.contains_key("ca_cert"));
        assert!(object.contains_key("password"));
    }

    #[test]
    fn test_provision_request_context_is_optional() {
        let req: ProvisionRequest =
            serde_json::from_str(r#"{"service_id": "s", "plan_id": "p"}"#).unwrap();
        assert_eq!(req.service_id, "s");
        assert!(req.context.is_none());
    }

    #[test]
    fn test_update_request_without_plan() {
        let req: UpdateRequest = serde_json::from_str(r#"{"service_id": "s"}"#).unwrap();
        assert!(req.plan_id.is_none());
    }
}
