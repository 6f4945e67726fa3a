//! Kubernetes manifests for an instance, rendered from YAML templates

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Namespace, Service};
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tera::{Context as TeraContext, Tera};

use crate::names;
use crate::types::PlanSpec;

/// Template engine with every manifest template loaded
pub struct Manifests {
    tera: Tera,
}

impl Manifests {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("namespace", include_str!("../templates/namespace.yaml"))?;
        tera.add_raw_template("cluster", include_str!("../templates/cluster.yaml"))?;
        tera.add_raw_template("load-balancer", include_str!("../templates/load-balancer.yaml"))?;
        tera.add_raw_template("pooler", include_str!("../templates/pooler.yaml"))?;
        Ok(Self { tera })
    }

    pub fn namespace(&self, instance_id: &str, plan_id: &str) -> Result<Namespace> {
        let mut ctx = TeraContext::new();
        ctx.insert("name", names::namespace(instance_id));
        ctx.insert("plan_id", plan_id);
        self.render("namespace", &ctx)
    }

    pub fn cluster(&self, instance_id: &str, plan_id: &str, spec: &PlanSpec) -> Result<DynamicObject> {
        let mut ctx = TeraContext::new();
        ctx.insert("name", names::cluster(instance_id));
        ctx.insert("namespace", names::namespace(instance_id));
        ctx.insert("plan_id", plan_id);
        ctx.insert("instances", &spec.instances);
        ctx.insert("cpu", &spec.cpu);
        ctx.insert("memory", &spec.memory);
        ctx.insert("storage", &spec.storage);
        self.render("cluster", &ctx)
    }

    /// LoadBalancer service forwarding `port` to PostgreSQL on the selected pods
    pub fn load_balancer(
        &self,
        instance_id: &str,
        name: &str,
        port: u16,
        selector: &BTreeMap<&str, String>,
    ) -> Result<Service> {
        let mut ctx = TeraContext::new();
        ctx.insert("name", name);
        ctx.insert("namespace", names::namespace(instance_id));
        ctx.insert("port", &port);
        ctx.insert("target_port", &names::POSTGRES_PORT);
        ctx.insert("selector", selector);
        self.render("load-balancer", &ctx)
    }

    pub fn pooler(&self, instance_id: &str, instances: i64) -> Result<DynamicObject> {
        let mut ctx = TeraContext::new();
        ctx.insert("name", &names::pooler(instance_id));
        ctx.insert("namespace", names::namespace(instance_id));
        ctx.insert("cluster", names::cluster(instance_id));
        ctx.insert("instances", &instances);
        self.render("pooler", &ctx)
    }

    fn render<T: DeserializeOwned>(&self, template: &str, ctx: &TeraContext) -> Result<T> {
        let yaml = self
            .tera
            .render(template, ctx)
            .with_context(|| format!("Failed to render {} manifest", template))?;
        serde_yaml::from_str(&yaml).with_context(|| format!("Invalid {} manifest", template))
    }
}
