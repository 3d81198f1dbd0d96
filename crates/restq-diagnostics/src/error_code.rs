//! Query compiler error codes following a structured numbering system
//!
//! Error code ranges:
//! - RQ0001-RQ0099: Unsupported constructs (expression has no filter representation)
//! - RQ0100-RQ0199: Argument errors (malformed caller input)
//! - RQ0200-RQ0299: Query chain errors (operator sequencing)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this code reports an unsupported construct (0001-0099)
    pub const fn is_unsupported(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this code reports malformed caller input (0100-0199)
    pub const fn is_argument_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this code reports a query chain error (0200-0299)
    pub const fn is_chain_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RQ{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Unsupported constructs (0001-0099)
    map.insert(
        1,
        ErrorInfo::new("Expression not supported by the filter grammar")
            .with_help("Evaluate the predicate locally or rewrite it using supported members"),
    );
    map.insert(2, ErrorInfo::new("Multiple unsupported expressions"));
    map.insert(3, ErrorInfo::new("Unknown method or member"));
    map.insert(4, ErrorInfo::new("Function argument count or type mismatch"));
    map.insert(5, ErrorInfo::new("Member is not mapped"));
    map.insert(6, ErrorInfo::new("Unsupported operator"));
    map.insert(7, ErrorInfo::new("Dictionary key is not a string literal"));
    map.insert(8, ErrorInfo::new("Constant evaluation failed"));
    map.insert(9, ErrorInfo::new("Literal cannot be formatted"));
    map.insert(10, ErrorInfo::new("Expression nesting too deep"));
    map.insert(11, ErrorInfo::new("Reference to a foreign parameter"));

    // Argument errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid argument"));
    map.insert(
        101,
        ErrorInfo::new("Expression is not a unary lambda")
            .with_help("Pass a lambda with exactly one parameter"),
    );
    map.insert(102, ErrorInfo::new("Lambda parameter type mismatch"));
    map.insert(103, ErrorInfo::new("Predicate body is not boolean"));

    // Query chain errors (0200-0299)
    map.insert(200, ErrorInfo::new("Unsupported query operator"));
    map.insert(201, ErrorInfo::new("Query operator out of order"));
    map.insert(202, ErrorInfo::new("Query chain has no source"));

    map
});

// Unsupported constructs
pub const RQ0001: ErrorCode = ErrorCode::new(1);
pub const RQ0002: ErrorCode = ErrorCode::new(2);
pub const RQ0003: ErrorCode = ErrorCode::new(3);
pub const RQ0004: ErrorCode = ErrorCode::new(4);
pub const RQ0005: ErrorCode = ErrorCode::new(5);
pub const RQ0006: ErrorCode = ErrorCode::new(6);
pub const RQ0007: ErrorCode = ErrorCode::new(7);
pub const RQ0008: ErrorCode = ErrorCode::new(8);
pub const RQ0009: ErrorCode = ErrorCode::new(9);
pub const RQ0010: ErrorCode = ErrorCode::new(10);
pub const RQ0011: ErrorCode = ErrorCode::new(11);

// Argument errors
pub const RQ0100: ErrorCode = ErrorCode::new(100);
pub const RQ0101: ErrorCode = ErrorCode::new(101);
pub const RQ0102: ErrorCode = ErrorCode::new(102);
pub const RQ0103: ErrorCode = ErrorCode::new(103);

// Query chain errors
pub const RQ0200: ErrorCode = ErrorCode::new(200);
pub const RQ0201: ErrorCode = ErrorCode::new(201);
pub const RQ0202: ErrorCode = ErrorCode::new(202);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(RQ0001.to_string(), "RQ0001");
        assert_eq!(RQ0100.to_string(), "RQ0100");
    }

    #[test]
    fn test_error_categories() {
        assert!(RQ0003.is_unsupported());
        assert!(!RQ0003.is_argument_error());
        assert!(RQ0102.is_argument_error());
        assert!(RQ0201.is_chain_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(RQ0003.info().description, "Unknown method or member");
        assert!(RQ0001.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
