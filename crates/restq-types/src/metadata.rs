//! Type metadata descriptions

use indexmap::IndexMap;
use restq_expr::HostType;
use serde::{Deserialize, Serialize};

/// Broad classification of a mapped type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Addressable resource with its own URL
    Resource,
    /// Structured value embedded in a resource
    Complex,
    /// Compiler-generated record with named members
    Anonymous,
    /// Positional tuple
    Tuple,
    /// Primitive value type
    Value,
}

/// Metadata for a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    /// Declared property name
    pub name: String,
    /// Property type
    pub ty: HostType,
    /// Name used in queries, when it differs from the naming convention
    pub mapped_name: Option<String>,
    /// Whether the property is exposed to queries
    pub mapped: bool,
}

impl PropertyMetadata {
    pub fn new(name: impl Into<String>, ty: HostType) -> Self {
        Self {
            name: name.into(),
            ty,
            mapped_name: None,
            mapped: true,
        }
    }

    /// Expose the property under a different name
    pub fn renamed(mut self, mapped_name: impl Into<String>) -> Self {
        self.mapped_name = Some(mapped_name.into());
        self
    }

    /// Hide the property from queries
    pub fn unmapped(mut self) -> Self {
        self.mapped = false;
        self
    }
}

/// Metadata for a type: its kind, constructor shape and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// Type name as reported by [`HostType::type_name`]
    pub name: String,
    pub kind: TypeKind,
    /// Constructor parameter names in order, when known
    pub constructor: Option<Vec<String>>,
    /// Properties in declaration order
    pub properties: IndexMap<String, PropertyMetadata>,
}

impl TypeMetadata {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constructor: None,
            properties: IndexMap::new(),
        }
    }

    /// Create metadata for a resource type
    pub fn resource(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Resource)
    }

    /// Create metadata for a complex type
    pub fn complex(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Complex)
    }

    /// Add a property
    pub fn with_property(mut self, property: PropertyMetadata) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Set constructor parameter names
    pub fn with_constructor<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.constructor = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.get(name)
    }

    /// Whether constructing this type denotes a projection
    pub fn is_projection_shape(&self) -> bool {
        matches!(self.kind, TypeKind::Anonymous | TypeKind::Tuple)
    }

    /// Derive metadata from the structure of a host type alone.
    ///
    /// Tuples get positional `Item{N}` properties; other types get no
    /// properties since their members are only known to the host.
    pub fn infer(ty: &HostType) -> Self {
        match ty {
            HostType::Tuple(items) => {
                let mut meta = Self::new(ty.type_name(), TypeKind::Tuple);
                for (i, item) in items.iter().enumerate() {
                    meta = meta.with_property(PropertyMetadata::new(
                        format!("Item{}", i + 1),
                        item.clone(),
                    ));
                }
                meta
            }
            HostType::Anonymous(name) => Self::new(name.clone(), TypeKind::Anonymous),
            HostType::Named(name) => Self::new(name.clone(), TypeKind::Complex),
            other => Self::new(other.type_name(), TypeKind::Value),
        }
    }
}
