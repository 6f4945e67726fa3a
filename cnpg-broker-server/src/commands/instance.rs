use anyhow::Result;
use cnpg_broker_models::{BindingResponse, InstanceResponse};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::config::Config;

/// HTTP client for a running broker
pub struct BrokerClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Option<(String, String)>,
}

impl BrokerClient {
    pub fn new(api_url: &str, config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials: config.credentials(),
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.http.request(method, format!("{}{}", self.api_url, path));
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to API: {}", e))?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            anyhow::bail!("{}", error_message(status, &body));
        }
        Ok((status, body))
    }
}

/// `API error (404 Not Found): not_found - instance x not found`
fn error_message(status: StatusCode, body: &Value) -> String {
    match (body["error"].as_str(), body["description"].as_str()) {
        (Some(code), Some(description)) => {
            format!("API error ({}): {} - {}", status, code, description)
        }
        _ => format!("API error: {}", status),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_catalog(client: &BrokerClient, output: &str) -> Result<()> {
    let (_, catalog) = client.send(Method::GET, "/v2/catalog", None).await?;

    if output == "json" {
        return print_json(&catalog);
    }

    println!("{:<38} {:<24} {:<10} {:<6} {:<6} {:<8} {:<8}",
             "PLAN ID", "SERVICE", "PLAN", "NODES", "CPU", "MEMORY", "STORAGE");
    println!("{}", "-".repeat(104));

    let empty = Vec::new();
    for service in catalog["services"].as_array().unwrap_or(&empty) {
        let service_name = service["name"].as_str().unwrap_or("-");
        for plan in service["plans"].as_array().unwrap_or(&empty) {
            println!("{:<38} {:<24} {:<10} {:<6} {:<6} {:<8} {:<8}",
                     plan["id"].as_str().unwrap_or("-"),
                     service_name,
                     plan["name"].as_str().unwrap_or("-"),
                     plan["spec"]["instances"].as_i64().unwrap_or(0),
                     plan["spec"]["cpu"].as_str().unwrap_or("-"),
                     plan["spec"]["memory"].as_str().unwrap_or("-"),
                     plan["spec"]["storage"].as_str().unwrap_or("-"));
        }
        println!("  service id: {}", service["id"].as_str().unwrap_or("-"));
    }

    Ok(())
}

pub async fn run_provision(
    client: &BrokerClient,
    instance_id: &str,
    service_id: &str,
    plan_id: &str,
    output: &str,
) -> Result<()> {
    let body = json!({ "service_id": service_id, "plan_id": plan_id });
    let (status, response) = client
        .send(Method::PUT, &format!("/v2/service_instances/{}", instance_id), Some(body))
        .await?;

    if output == "json" {
        return print_json(&response);
    }

    if status == StatusCode::CREATED {
        println!("✓ Provisioning started for instance {}", instance_id);
        println!("  Use 'cnpg-broker status {}' to follow progress", instance_id);
    } else {
        println!("✓ Instance {} is already provisioned with this plan", instance_id);
    }
    Ok(())
}

pub async fn run_status(client: &BrokerClient, instance_id: &str, output: &str) -> Result<()> {
    let (_, response) = client
        .send(Method::GET, &format!("/v2/service_instances/{}", instance_id), None)
        .await?;

    if output == "json" {
        return print_json(&response);
    }

    let instance: InstanceResponse = serde_json::from_value(response)?;
    println!("Instance: {}", instance.instance_id);
    println!("{}", "=".repeat(60));
    println!();
    println!("  Status:             {}", instance.status.as_str());
    println!("  Phase:              {}", if instance.phase.is_empty() { "-" } else { instance.phase.as_str() });
    println!("  Ready Instances:    {}/{}", instance.ready_instances, instance.instances);
    println!("  Namespace:          {}", instance.namespace);
    if !instance.labels.is_empty() {
        println!();
        println!("Labels:");
        for (key, value) in &instance.labels {
            println!("  {}: {}", key, value);
        }
    }
    Ok(())
}

pub async fn run_update(
    client: &BrokerClient,
    instance_id: &str,
    service_id: &str,
    plan_id: &str,
    output: &str,
) -> Result<()> {
    let body = json!({ "service_id": service_id, "plan_id": plan_id });
    let (_, response) = client
        .send(Method::PATCH, &format!("/v2/service_instances/{}", instance_id), Some(body))
        .await?;

    if output == "json" {
        return print_json(&response);
    }
    println!("✓ Instance {} updated to plan {}", instance_id, plan_id);
    Ok(())
}

pub async fn run_deprovision(client: &BrokerClient, instance_id: &str, output: &str) -> Result<()> {
    let (_, response) = client
        .send(Method::DELETE, &format!("/v2/service_instances/{}", instance_id), None)
        .await?;

    if output == "json" {
        return print_json(&response);
    }
    println!("✓ Instance {} deprovisioned", instance_id);
    Ok(())
}

pub async fn run_bind(
    client: &BrokerClient,
    instance_id: &str,
    binding_id: &str,
    output: &str,
) -> Result<()> {
    let path = format!("/v2/service_instances/{}/service_bindings/{}", instance_id, binding_id);
    let (_, response) = client.send(Method::PUT, &path, Some(json!({}))).await?;

    if output == "json" {
        return print_json(&response);
    }

    let binding: BindingResponse = serde_json::from_value(response)?;
    let creds = binding.credentials;
    println!("Binding: {}", binding_id);
    println!("{}", "=".repeat(60));
    println!();
    println!("  Host:               {}:{}", creds.host, creds.port);
    println!("  Database:           {}", creds.database);
    println!("  Username:           {}", creds.username);
    println!("  URI:                {}", creds.uri);
    if let Some(ro_uri) = &creds.ro_uri {
        println!("  Read-only URI:      {}", ro_uri);
    }
    if let Some(lb_uri) = &creds.lb_uri {
        println!("  External URI:       {}", lb_uri);
    }
    if let Some(pooler_uri) = &creds.pooler_uri {
        println!("  Pooler URI:         {}", pooler_uri);
    }
    if creds.ca_cert.is_some() {
        println!("  CA certificate:     included (use --output json)");
    }
    Ok(())
}

pub async fn run_unbind(
    client: &BrokerClient,
    instance_id: &str,
    binding_id: &str,
    output: &str,
) -> Result<()> {
    let path = format!("/v2/service_instances/{}/service_bindings/{}", instance_id, binding_id);
    let (_, response) = client.send(Method::DELETE, &path, None).await?;

    if output == "json" {
        return print_json(&response);
    }
    println!("✓ Binding {} removed", binding_id);
    Ok(())
}
