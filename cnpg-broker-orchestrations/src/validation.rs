//! Identifier validation for broker requests

use std::sync::Arc;
use thiserror::Error;
use uuid::{Uuid, Variant};

use crate::catalog::Catalog;

/// Longest identifier accepted; instance ids double as namespace names
const MAX_ID_LEN: usize = 63;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Validates identifiers and checks service/plan ids against the catalog
#[derive(Debug, Clone)]
pub struct Validator {
    catalog: Arc<Catalog>,
}

impl Validator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn validate_instance_id(&self, instance_id: &str) -> Result<(), ValidationError> {
        validate_uuid("instance_id", instance_id)
    }

    pub fn validate_binding_id(&self, binding_id: &str) -> Result<(), ValidationError> {
        validate_uuid("binding_id", binding_id)
    }

    pub fn validate_service_id(&self, service_id: &str) -> Result<(), ValidationError> {
        validate_uuid("service_id", service_id)?;
        match self.catalog.find_service(service_id) {
            Some(_) => Ok(()),
            None => Err(ValidationError::new("service_id", "not found in catalog")),
        }
    }

    pub fn validate_plan_id(&self, service_id: &str, plan_id: &str) -> Result<(), ValidationError> {
        validate_uuid("plan_id", plan_id)?;
        let service = self
            .catalog
            .find_service(service_id)
            .ok_or_else(|| ValidationError::new("plan_id", "service not found"))?;

        if service.plans.iter().any(|p| p.id == plan_id) {
            Ok(())
        } else {
            Err(ValidationError::new("plan_id", "not found for this service"))
        }
    }
}

/// Lowercase, hyphenated, version 4 UUID
fn validate_uuid(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "required"));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::new(field, "must be 63 characters or less"));
    }

    let canonical = Uuid::parse_str(value).ok().filter(|uuid| {
        uuid.get_version_num() == 4
            && uuid.get_variant() == Variant::RFC4122
            && uuid.hyphenated().to_string() == value
    });

    match canonical {
        Some(_) => Ok(()),
        None => Err(ValidationError::new(field, "must be valid UUID")),
    }
}
