//! Type mapping trait consumed by the query compiler

use crate::TypeMetadata;
use restq_expr::HostType;
use serde::{Deserialize, Serialize};

/// Answers how host members map to names in the query grammar.
///
/// Implemented by the resource/type-mapping layer. All methods must be pure
/// with respect to their inputs so results can be cached.
pub trait TypeMapping: Send + Sync {
    /// Name of a property as it appears in queries
    fn resolve_property_name(&self, declaring_type: &HostType, property: &str) -> String;

    /// Whether a property is exposed to queries at all
    fn is_member_mapped(&self, declaring_type: &HostType, property: &str) -> bool {
        let _ = (declaring_type, property);
        true
    }

    /// Metadata for a type, when the mapping knows it
    fn type_metadata(&self, ty: &HostType) -> Option<TypeMetadata> {
        Some(TypeMetadata::infer(ty))
    }
}

/// Naming convention applied to property names without an explicit mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingConvention {
    /// Lower-case the first character (`CashAmount` -> `cashAmount`)
    #[default]
    CamelCase,
    /// Keep the declared name
    AsDeclared,
}

impl NamingConvention {
    /// Apply the convention to a declared name
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::CamelCase => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Self::AsDeclared => name.to_string(),
        }
    }
}

/// Mapping that only applies a naming convention
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionMapping {
    pub naming: NamingConvention,
}

impl ConventionMapping {
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }
}

impl TypeMapping for ConventionMapping {
    fn resolve_property_name(&self, _declaring_type: &HostType, property: &str) -> String {
        self.naming.apply(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(NamingConvention::CamelCase.apply("CashAmount"), "cashAmount");
        assert_eq!(NamingConvention::CamelCase.apply("SomeList"), "someList");
        assert_eq!(NamingConvention::CamelCase.apply("x"), "x");
        assert_eq!(NamingConvention::CamelCase.apply(""), "");
        assert_eq!(NamingConvention::AsDeclared.apply("Jalla"), "Jalla");
    }

    #[test]
    fn test_convention_mapping() {
        let mapping = ConventionMapping::default();
        let ty = HostType::named("TestResource");
        assert_eq!(mapping.resolve_property_name(&ty, "Jalla"), "jalla");
        assert!(mapping.is_member_mapped(&ty, "Jalla"));
    }
}
