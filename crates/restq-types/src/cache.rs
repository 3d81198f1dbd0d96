//! Read-through metadata cache
//!
//! Wraps a [`TypeMapping`] and memoizes its answers. Lookups take a shared
//! read lock; a miss is computed with no lock held and then published with
//! add-if-absent semantics, so threads racing on the same key converge on
//! whichever value was stored first.

use crate::{TypeMapping, TypeMetadata};
use parking_lot::RwLock;
use restq_expr::HostType;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Resolved mapping of one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMapping {
    /// Name used in queries
    pub name: String,
    /// Whether the property is exposed
    pub mapped: bool,
}

type PropertyKey = (HostType, String);

/// Thread-safe read-through cache over a [`TypeMapping`]
pub struct MetadataCache {
    mapping: Arc<dyn TypeMapping>,
    types: RwLock<HashMap<HostType, Option<Arc<TypeMetadata>>>>,
    properties: RwLock<HashMap<PropertyKey, Arc<PropertyMapping>>>,
}

fn read_through<K, V>(map: &RwLock<HashMap<K, V>>, key: K, compute: impl FnOnce() -> V) -> V
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(hit) = map.read().get(&key) {
        return hit.clone();
    }
    let computed = compute();
    map.write().entry(key).or_insert(computed).clone()
}

impl MetadataCache {
    /// Create a cache in front of a mapping
    pub fn new(mapping: Arc<dyn TypeMapping>) -> Self {
        Self {
            mapping,
            types: RwLock::new(HashMap::new()),
            properties: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying mapping
    pub fn mapping(&self) -> &Arc<dyn TypeMapping> {
        &self.mapping
    }

    /// Metadata for a type
    pub fn type_metadata(&self, ty: &HostType) -> Option<Arc<TypeMetadata>> {
        read_through(&self.types, ty.clone(), || {
            log::trace!("caching metadata for {}", ty);
            self.mapping.type_metadata(ty).map(Arc::new)
        })
    }

    /// Resolved mapping for a property
    pub fn property(&self, declaring_type: &HostType, property: &str) -> Arc<PropertyMapping> {
        let key = (declaring_type.clone(), property.to_string());
        read_through(&self.properties, key, || {
            Arc::new(PropertyMapping {
                name: self.mapping.resolve_property_name(declaring_type, property),
                mapped: self.mapping.is_member_mapped(declaring_type, property),
            })
        })
    }

    #[cfg(test)]
    fn cached_types(&self) -> usize {
        self.types.read().len()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("types", &self.types.read().len())
            .field("properties", &self.properties.read().len())
            .finish()
    }
}
