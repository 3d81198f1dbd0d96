//! Mapping registry implementing TypeMapping
//!
//! A concrete [`TypeMapping`] built from registered [`TypeMetadata`] plus a
//! naming convention for everything not registered explicitly.

use crate::{NamingConvention, TypeMapping, TypeMetadata};
use restq_expr::HostType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Errors raised while loading a registry definition
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Invalid mapping definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate type definition: {0}")]
    DuplicateType(String),
}

/// Serialized form of a registry
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDefinition {
    #[serde(default)]
    naming: NamingConvention,
    #[serde(default)]
    types: Vec<TypeMetadata>,
}

/// Registry of type metadata
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    naming: NamingConvention,
    types: HashMap<String, TypeMetadata>,
}

impl MappingRegistry {
    /// Create an empty registry using camel-case naming
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the naming convention
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Register a type, replacing any previous registration of the same name
    pub fn with_type(mut self, metadata: TypeMetadata) -> Self {
        self.types.insert(metadata.name.clone(), metadata);
        self
    }

    /// Load a registry from its JSON definition
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let definition: RegistryDefinition = serde_json::from_str(json)?;
        let mut registry = Self::new().with_naming(definition.naming);
        for metadata in definition.types {
            if registry.types.contains_key(&metadata.name) {
                return Err(MappingError::DuplicateType(metadata.name));
            }
            registry.types.insert(metadata.name.clone(), metadata);
        }
        log::debug!("loaded mapping registry with {} types", registry.types.len());
        Ok(registry)
    }

    pub fn naming(&self) -> NamingConvention {
        self.naming
    }

    /// Get registered metadata for a type name
    pub fn get(&self, name: &str) -> Option<&TypeMetadata> {
        self.types.get(name)
    }
}

impl TypeMapping for MappingRegistry {
    fn resolve_property_name(&self, declaring_type: &HostType, property: &str) -> String {
        self.get(&declaring_type.underlying().type_name())
            .and_then(|meta| meta.property(property))
            .and_then(|prop| prop.mapped_name.clone())
            .unwrap_or_else(|| self.naming.apply(property))
    }

    fn is_member_mapped(&self, declaring_type: &HostType, property: &str) -> bool {
        self.get(&declaring_type.underlying().type_name())
            .and_then(|meta| meta.property(property))
            .is_none_or(|prop| prop.mapped)
    }

    fn type_metadata(&self, ty: &HostType) -> Option<TypeMetadata> {
        let ty = ty.underlying();
        self.get(&ty.type_name())
            .cloned()
            .or_else(|| Some(TypeMetadata::infer(ty)))
    }
}
