//! Diagnostic reporting types
//!
//! Every diagnostic describes a query that cannot be sent as written, so
//! there is no severity: a compile error either happens or it does not.

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile failure with the offending expression and nested causes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    /// Text of the host sub-expression the diagnostic refers to
    pub expression: Option<String>,
    /// Registry help for the code, if any
    pub help: Option<String>,
    /// One entry per independent failure of an aggregate
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    /// Create a diagnostic carrying the registry help for `code`
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            expression: None,
            help: code.info().help.map(str::to_string),
            related: Vec::new(),
        }
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)?;
        if let Some(expr) = &self.expression {
            write!(f, " in `{}`", expr)?;
        }
        Ok(())
    }
}

/// One nested failure inside an aggregate diagnostic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedInfo {
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RQ0001, RQ0003};

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(RQ0003, "Unknown method 'Frobnicate'")
            .with_expression("x.Jalla.Frobnicate()");
        assert_eq!(
            diag.to_string(),
            "error[RQ0003]: Unknown method 'Frobnicate' in `x.Jalla.Frobnicate()`"
        );
    }

    #[test]
    fn test_error_carries_registry_help() {
        let diag = Diagnostic::error(RQ0001, "not supported").with_related(RelatedInfo::new("cause"));
        assert!(diag.help.is_some());
        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].code, None);
    }
}
