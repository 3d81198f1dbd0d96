//! Compiler errors
//!
//! Ordinary unsupported constructs never surface as errors during rewriting;
//! they are recorded in-tree as [`UnsupportedCause`]s on unsupported markers.
//! [`CompileError`] is what callers see when they print such a tree or pass
//! malformed input.

use restq_diagnostics::{
    Diagnostic, ErrorCode, RQ0001, RQ0002, RQ0003, RQ0004, RQ0005, RQ0006, RQ0007, RQ0008, RQ0009,
    RQ0010, RQ0011, RelatedInfo,
};
use thiserror::Error;

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while folding a closed-over sub-expression to a constant
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: String },

    #[error("Null reference while reading '{member}'")]
    NullReference { member: String },

    #[error("Type {type_name} has no member '{member}'")]
    MissingMember { type_name: String, member: String },

    #[error("Key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("Index {index} out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("Cannot convert {from} to {to}")]
    InvalidConversion { from: String, to: String },

    #[error("Operator {operator} cannot be applied to {operands}")]
    TypeMismatch { operator: String, operands: String },

    #[error("Expression `{expression}` cannot be evaluated")]
    NotEvaluable { expression: String },

    #[error("Host method {method} failed: {message}")]
    HostFailure { method: String, message: String },

    #[error("Expression nesting too deep to evaluate")]
    DepthExceeded,
}

/// Errors raised when a constant has no literal form
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LiteralError {
    #[error("Non-finite number {value} has no literal form")]
    NonFinite { value: String },

    #[error("Values of type {type_name} have no literal form")]
    UnsupportedValue { type_name: String },
}

/// Why a node was marked unsupported
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnsupportedCause {
    #[error("Unknown method {declaring_type}.{method}")]
    UnknownMethod {
        declaring_type: String,
        method: String,
    },

    #[error("Unknown member {declaring_type}.{member}")]
    UnknownMember {
        declaring_type: String,
        member: String,
    },

    #[error("Function {function}: {message}")]
    ArityOrTypeMismatch { function: String, message: String },

    #[error("Member {declaring_type}.{member} is not mapped")]
    UnmappedMember {
        declaring_type: String,
        member: String,
    },

    #[error("Operator {operator} is not supported")]
    UnsupportedOperator { operator: String },

    #[error("Indexer on {ty} is not supported")]
    UnsupportedIndexer { ty: String },

    #[error("Dictionary key `{key}` is not a string literal")]
    NonLiteralKey { key: String },

    #[error("Constant evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error("Expression nesting exceeds {max} levels")]
    DepthExceeded { max: usize },

    #[error("Parameter '{name}' is not bound by the lambda")]
    ForeignParameter { name: String },
}

impl UnsupportedCause {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownMethod { .. } | Self::UnknownMember { .. } => RQ0003,
            Self::ArityOrTypeMismatch { .. } => RQ0004,
            Self::UnmappedMember { .. } => RQ0005,
            Self::UnsupportedOperator { .. } => RQ0006,
            Self::UnsupportedIndexer { .. } => RQ0001,
            Self::NonLiteralKey { .. } => RQ0007,
            Self::Evaluation(_) => RQ0008,
            Self::Literal(_) => RQ0009,
            Self::DepthExceeded { .. } => RQ0010,
            Self::ForeignParameter { .. } => RQ0011,
        }
    }
}

/// Caller-visible compile error
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// A single sub-expression has no representation in the filter grammar
    #[error("Expression `{expression}` is not supported by the query provider")]
    UnsupportedConstruct {
        /// Text of the original sub-expression
        expression: String,
        #[source]
        cause: Option<UnsupportedCause>,
    },

    /// Several independent sub-expressions have no representation
    #[error("{} expressions are not supported by the query provider", .0.len())]
    AggregateUnsupported(Vec<CompileError>),

    /// Malformed caller input
    #[error("{code}: {message}")]
    InvalidArgument { code: ErrorCode, message: String },

    /// Query chain cannot be translated
    #[error("{code}: {message}")]
    Chain { code: ErrorCode, message: String },
}

impl CompileError {
    /// Create an argument validation error
    pub fn invalid_argument(code: ErrorCode, message: impl Into<String>) -> Self {
        debug_assert!(code.is_argument_error(), "{code} is not an argument error code");
        Self::InvalidArgument {
            code,
            message: message.into(),
        }
    }

    /// Create a query chain error
    pub fn chain(code: ErrorCode, message: impl Into<String>) -> Self {
        debug_assert!(code.is_chain_error(), "{code} is not a query chain error code");
        Self::Chain {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedConstruct { cause, .. } => {
                cause.as_ref().map_or(RQ0001, UnsupportedCause::code)
            }
            Self::AggregateUnsupported(_) => RQ0002,
            Self::InvalidArgument { code, .. } | Self::Chain { code, .. } => *code,
        }
    }

    /// Whether the caller may fall back to evaluating the query locally
    pub fn is_recoverable(&self) -> bool {
        self.code().is_unsupported()
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnsupportedConstruct { expression, cause } => {
                let message = match cause {
                    Some(cause) => cause.to_string(),
                    None => self.to_string(),
                };
                Diagnostic::error(self.code(), message).with_expression(expression.clone())
            }
            Self::AggregateUnsupported(errors) => errors.iter().fold(
                Diagnostic::error(self.code(), self.to_string()),
                |diag, err| {
                    let related = match err {
                        Self::UnsupportedConstruct { expression, .. } => {
                            format!("{} in `{}`", err.to_diagnostic().message, expression)
                        }
                        other => other.to_string(),
                    };
                    diag.with_related(RelatedInfo::new(related).with_code(err.code()))
                },
            ),
            Self::InvalidArgument { code, message } | Self::Chain { code, message } => {
                Diagnostic::error(*code, message.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restq_diagnostics::{RQ0101, RQ0201};
    use std::error::Error as _;

    #[test]
    fn test_unsupported_code_follows_cause() {
        let err = CompileError::UnsupportedConstruct {
            expression: "x.Jalla.Frobnicate()".to_string(),
            cause: Some(UnsupportedCause::UnknownMethod {
                declaring_type: "String".to_string(),
                method: "Frobnicate".to_string(),
            }),
        };
        assert_eq!(err.code(), RQ0003);
        assert!(err.is_recoverable());
        assert!(err.source().is_some());

        let diag = err.to_diagnostic();
        assert_eq!(diag.expression.as_deref(), Some("x.Jalla.Frobnicate()"));
        assert!(diag.message.contains("Frobnicate"));
    }

    #[test]
    fn test_aggregate_diagnostic_lists_causes() {
        let one = CompileError::UnsupportedConstruct {
            expression: "a".to_string(),
            cause: Some(UnsupportedCause::Evaluation(EvalError::DivisionByZero)),
        };
        let two = CompileError::UnsupportedConstruct {
            expression: "b".to_string(),
            cause: None,
        };
        let err = CompileError::AggregateUnsupported(vec![one, two]);
        assert_eq!(err.code(), RQ0002);
        assert_eq!(err.to_string(), "2 expressions are not supported by the query provider");

        let diag = err.to_diagnostic();
        assert_eq!(diag.related.len(), 2);
        assert_eq!(diag.related[0].code, Some(RQ0008));
        assert_eq!(diag.related[1].code, Some(RQ0001));
    }

    #[test]
    fn test_invalid_argument_is_not_recoverable() {
        let err = CompileError::invalid_argument(RQ0101, "Expected a lambda");
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "RQ0101: Expected a lambda");
    }

    #[test]
    fn test_chain_error_is_not_recoverable() {
        let err = CompileError::chain(RQ0201, "Where after Select");
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), RQ0201);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not an argument error code")]
    fn test_argument_error_rejects_chain_code() {
        let _ = CompileError::invalid_argument(RQ0201, "misfiled");
    }
}
