//! Compiler configuration

use serde::{Deserialize, Serialize};

/// Options controlling which constructs the compiler will lower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Allow `lt`, `le`, `gt` and `ge` comparisons
    pub ordering_comparisons: bool,
    /// Allow `add`, `sub`, `mul`, `div` and `mod`
    pub arithmetic: bool,
    /// Maximum expression nesting depth before a subtree is marked unsupported
    pub max_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            ordering_comparisons: true,
            arithmetic: true,
            max_depth: 256,
        }
    }
}

impl CompilerOptions {
    /// Restrict comparisons to `eq` and `ne`
    pub fn equality_only() -> Self {
        Self {
            ordering_comparisons: false,
            ..Self::default()
        }
    }

    /// Load options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
