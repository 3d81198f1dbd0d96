//! High-level compiler API
//!
//! [`QueryCompiler`] validates caller input, runs the rewriter and prints the
//! result. Malformed input fails fast with an argument error; unsupported
//! constructs fail only when the tree is printed.

use crate::chain::{self, QueryParameters};
use crate::printer::print;
use crate::rewrite::{RootMode, Rewriter};
use crate::{CompileError, CompileResult, CompilerOptions, QueryNode};
use restq_diagnostics::{RQ0101, RQ0102, RQ0103};
use restq_expr::{Expression, HostType, Lambda};
use restq_types::{MetadataCache, TypeMapping};
use std::sync::Arc;

/// Compiles host expressions into filter text
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    cache: Arc<MetadataCache>,
    options: CompilerOptions,
}

impl QueryCompiler {
    /// Create a compiler with its own metadata cache
    pub fn new(mapping: Arc<dyn TypeMapping>) -> Self {
        Self::with_cache(Arc::new(MetadataCache::new(mapping)))
    }

    /// Create a compiler sharing an existing cache
    pub fn with_cache(cache: Arc<MetadataCache>) -> Self {
        Self {
            cache,
            options: CompilerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Rewrite a unary lambda under the given root mode.
    ///
    /// When `parameter_type` is given, the lambda's parameter must have
    /// exactly that type.
    pub fn rewrite(
        &self,
        expr: &Expression,
        mode: RootMode,
        parameter_type: Option<&HostType>,
    ) -> CompileResult<QueryNode> {
        let lambda = unary_lambda(expr)?;
        let rewriter = Rewriter::new(&self.cache, &self.options, lambda, mode).ok_or_else(|| not_unary(expr))?;

        let parameter = rewriter.classifier().parameter();
        if let Some(expected) = parameter_type.filter(|ty| **ty != parameter.ty) {
            return Err(CompileError::invalid_argument(
                RQ0102,
                format!(
                    "Lambda parameter '{}' has type {} but {} was expected",
                    parameter.name, parameter.ty, expected
                ),
            ));
        }

        Ok(rewriter.rewrite())
    }

    /// Rewrite a boolean predicate lambda
    pub fn rewrite_predicate(&self, expr: &Expression, parameter_type: Option<&HostType>) -> CompileResult<QueryNode> {
        let lambda = unary_lambda(expr)?;
        let body_type = lambda.return_type();
        if !body_type.is_boolean() {
            return Err(CompileError::invalid_argument(
                RQ0103,
                format!("Predicate body has type {}, expected Boolean", body_type),
            ));
        }
        self.rewrite(expr, RootMode::Value, parameter_type)
    }

    /// Rewrite a selector lambda
    pub fn rewrite_selector(&self, expr: &Expression, parameter_type: Option<&HostType>) -> CompileResult<QueryNode> {
        self.rewrite(expr, RootMode::Selector, parameter_type)
    }

    /// Compile a predicate lambda to filter text
    pub fn compile_predicate(&self, expr: &Expression) -> CompileResult<String> {
        print(&self.rewrite_predicate(expr, None)?)
    }

    /// Compile a selector lambda to select-list text
    pub fn compile_selector(&self, expr: &Expression) -> CompileResult<String> {
        print(&self.rewrite_selector(expr, None)?)
    }

    /// Translate a query chain rooted at a query source
    pub fn translate_query(&self, expr: &Expression) -> CompileResult<QueryParameters> {
        let params = chain::translate(self, expr)?;
        log::trace!("translated query chain into {} parameters", params.to_pairs().len());
        Ok(params)
    }
}

fn not_unary(expr: &Expression) -> CompileError {
    CompileError::invalid_argument(RQ0101, format!("Expected a unary lambda, got `{}`", expr))
}

/// Unwrap a (possibly quoted) unary lambda
pub(crate) fn unary_lambda(expr: &Expression) -> CompileResult<&Lambda> {
    match expr.strip_conversions() {
        Expression::Lambda(lambda) if lambda.parameter().is_some() => Ok(lambda),
        _ => Err(not_unary(expr)),
    }
}
