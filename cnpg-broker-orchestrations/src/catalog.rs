//! Service catalog: offered services, their plans, and the resources a plan
//! provisions
//!
//! The catalog is built once at startup (built-in offering or a YAML file)
//! and shared immutably behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::PlanSpec;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// A plan of a service offering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub free: bool,
    pub spec: PlanSpec,
}

/// A service offering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub bindable: bool,
    #[serde(default = "default_true")]
    pub plan_updateable: bool,
    pub plans: Vec<Plan>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub services: Vec<ServiceOffering>,
}

impl Catalog {
    /// Load a catalog from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML and check that plan ids are unique
    pub fn from_yaml(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(contents)?;

        let mut seen = std::collections::HashSet::new();
        for plan in catalog.services.iter().flat_map(|s| &s.plans) {
            if !seen.insert(plan.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate plan id '{}'", plan.id)));
            }
        }

        Ok(catalog)
    }

    pub fn services(&self) -> &[ServiceOffering] {
        &self.services
    }

    pub fn find_service(&self, service_id: &str) -> Option<&ServiceOffering> {
        self.services.iter().find(|s| s.id == service_id)
    }

    pub fn find_plan(&self, plan_id: &str) -> Option<&Plan> {
        self.services
            .iter()
            .flat_map(|s| &s.plans)
            .find(|p| p.id == plan_id)
    }

    /// Resources for a plan; unknown plans get [`PlanSpec::default`]
    pub fn plan_spec(&self, plan_id: &str) -> PlanSpec {
        self.find_plan(plan_id)
            .map(|p| p.spec.clone())
            .unwrap_or_default()
    }
}

impl Default for Catalog {
    /// The built-in offering: a single-node dev service and an HA service
    fn default() -> Self {
        fn plan(id: &str, name: &str, description: &str, spec: PlanSpec) -> Plan {
            Plan {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                free: true,
                spec,
            }
        }

        Self {
            services: vec![
                ServiceOffering {
                    id: "79f7fb16-c95d-4210-8930-1c758648327e".to_string(),
                    name: "postgresql-dev-db".to_string(),
                    description: "CloudNativePG PostgreSQL development database".to_string(),
                    bindable: true,
                    plan_updateable: true,
                    plans: vec![
                        plan(
                            "22cedd15-900f-4625-9f10-a57f43c64585",
                            "dev-small",
                            "1 instance, 0.5 CPU, 512MB RAM, 10GB storage, no SLA",
                            PlanSpec::new(1, "500m", "512Mi", "10Gi"),
                        ),
                        plan(
                            "de7acc66-412d-41c0-bf3e-763307a86c38",
                            "dev-medium",
                            "1 instance, 2 CPU, 2GB RAM, 50GB storage, no SLA",
                            PlanSpec::new(1, "2", "2Gi", "50Gi"),
                        ),
                        plan(
                            "bfefc341-29a1-48e5-a6be-690f44aabbb3",
                            "dev-large",
                            "1 instance, 4 CPU, 4GB RAM, 250GB storage, no SLA",
                            PlanSpec::new(1, "4", "4Gi", "250Gi"),
                        ),
                    ],
                },
                ServiceOffering {
                    id: "a651d10f-25ab-4a75-99a6-520c0abbe2ae".to_string(),
                    name: "postgresql-ha-cluster".to_string(),
                    description: "CloudNativePG PostgreSQL database cluster".to_string(),
                    bindable: true,
                    plan_updateable: true,
                    plans: vec![
                        plan(
                            "9098f862-fb7e-42b5-9e8c-94c49e231cc3",
                            "small",
                            "3 instances, 1 CPU, 1GB RAM, 10GB storage",
                            PlanSpec::new(3, "1", "1Gi", "10Gi"),
                        ),
                        plan(
                            "31aaeae1-4716-4631-b43e-93144e689427",
                            "medium",
                            "3 instances, 2 CPU, 2GB RAM, 50GB storage",
                            PlanSpec::new(3, "2", "2Gi", "50Gi"),
                        ),
                        plan(
                            "b870dc08-1110-4bf8-ac82-e8a9d2bdd5c7",
                            "large",
                            "3 instances, 4 CPU, 4GB RAM, 250GB storage",
                            PlanSpec::new(3, "4", "4Gi", "250Gi"),
                        ),
                    ],
                },
            ],
        }
    }
}
