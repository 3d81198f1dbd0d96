//! Query chain translation
//!
//! Flattens a chain of query operators applied to a query source
//! (`source.Where(..).OrderBy(..).Take(..)`) into query parameters.
//! Operators must appear in an order the query grammar can express.

use crate::compiler::{QueryCompiler, unary_lambda};
use crate::fold;
use crate::printer::print;
use crate::query::{LogicalOp, QueryNode};
use crate::rewrite::RootMode;
use crate::{CompileError, CompileResult};
use restq_diagnostics::{RQ0100, RQ0200, RQ0201, RQ0202};
use restq_expr::{Expression, HostType, MethodCall};
use serde::{Deserialize, Serialize};

/// One `$orderby` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: String,
    pub descending: bool,
}

impl OrderByItem {
    fn render(&self) -> String {
        if self.descending {
            format!("{} desc", self.expression)
        } else {
            self.expression.clone()
        }
    }
}

/// Query parameters produced from a query chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    pub filter: Option<String>,
    pub select: Option<String>,
    pub select_many: Option<String>,
    pub order_by: Vec<OrderByItem>,
    pub top: Option<i64>,
    pub skip: Option<i64>,
    /// Expanded paths; shallow expansions carry a `!` suffix
    pub expand: Vec<String>,
    pub include_total_count: bool,
}

impl QueryParameters {
    /// Parameters as `(key, value)` pairs in canonical order, omitting
    /// those that are unset
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        if let Some(select) = &self.select {
            pairs.push(("$select", select.clone()));
        }
        if let Some(select_many) = &self.select_many {
            pairs.push(("$selectmany", select_many.clone()));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(OrderByItem::render).collect();
            pairs.push(("$orderby", keys.join(",")));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        if !self.expand.is_empty() {
            pairs.push(("$expand", self.expand.join(",")));
        }
        if self.include_total_count {
            pairs.push(("$totalcount", "true".to_string()));
        }
        pairs
    }
}

/// Operators in the order they were applied to the source
fn flatten(expr: &Expression) -> CompileResult<(HostType, Vec<&MethodCall>)> {
    let mut calls = Vec::new();
    let mut current = expr;
    loop {
        match current.strip_conversions() {
            Expression::QuerySource(source) => {
                calls.reverse();
                return Ok((source.element_type.clone(), calls));
            }
            Expression::Call(call) => match &call.target {
                Some(target) => {
                    calls.push(call);
                    current = target;
                }
                None => break,
            },
            _ => break,
        }
    }
    Err(CompileError::chain(
        RQ0202,
        format!("Query chain `{}` is not rooted at a query source", expr),
    ))
}

/// Suffix marking an expansion to references only
const SHALLOW_SUFFIX: char = '!';

/// Chain translation state
struct Translation<'a> {
    compiler: &'a QueryCompiler,
    element_type: HostType,
    filters: Vec<QueryNode>,
    params: QueryParameters,
    /// Set once a terminal operator has been applied
    terminal: Option<&'a str>,
}

pub(crate) fn translate(compiler: &QueryCompiler, expr: &Expression) -> CompileResult<QueryParameters> {
    let (element_type, calls) = flatten(expr)?;
    let mut translation = Translation {
        compiler,
        element_type,
        filters: Vec::new(),
        params: QueryParameters::default(),
        terminal: None,
    };

    for (position, call) in calls.into_iter().enumerate() {
        translation.apply(position, call)?;
    }
    translation.finish()
}

impl<'a> Translation<'a> {
    fn out_of_order(&self, call: &MethodCall, reason: &str) -> CompileError {
        CompileError::chain(RQ0201, format!("{} {}", call.method.name, reason))
    }

    fn lambda_arg<'e>(&self, call: &'e MethodCall) -> CompileResult<&'e Expression> {
        match call.args.as_slice() {
            [arg] => {
                unary_lambda(arg)?;
                Ok(arg)
            }
            _ => Err(CompileError::invalid_argument(
                RQ0100,
                format!("{} expects a single lambda argument", call.method.name),
            )),
        }
    }

    fn count_arg(&self, call: &MethodCall) -> CompileResult<i64> {
        let invalid = |message: String| CompileError::invalid_argument(RQ0100, message);
        let [arg] = call.args.as_slice() else {
            return Err(invalid(format!("{} expects a single count argument", call.method.name)));
        };
        let value = fold::evaluate(arg).map_err(|err| invalid(format!("{}: {}", call.method.name, err)))?;
        match value.as_i64() {
            Some(n) if n >= 0 => Ok(n),
            _ => Err(invalid(format!(
                "{} expects a non-negative integer, got {}",
                call.method.name, value
            ))),
        }
    }

    /// Print a value-mode lambda over the element type
    fn key(&self, lambda: &Expression) -> CompileResult<String> {
        let node = self
            .compiler
            .rewrite(lambda, RootMode::Value, Some(&self.element_type))?;
        print(&node)
    }

    fn apply(&mut self, position: usize, call: &'a MethodCall) -> CompileResult<()> {
        if let Some(terminal) = self.terminal {
            return Err(self.out_of_order(call, &format!("cannot follow {}", terminal)));
        }
        if self.params.select.is_some() {
            return Err(self.out_of_order(call, "cannot follow Select"));
        }
        let paged = self.params.top.is_some() || self.params.skip.is_some();

        match call.method.name.as_str() {
            "Where" => {
                if paged {
                    return Err(self.out_of_order(call, "cannot follow Take or Skip"));
                }
                let lambda = self.lambda_arg(call)?;
                let node = self.compiler.rewrite_predicate(lambda, Some(&self.element_type))?;
                self.filters.push(node);
            }
            "Select" => {
                let lambda = self.lambda_arg(call)?;
                let node = self.compiler.rewrite_selector(lambda, Some(&self.element_type))?;
                self.params.select = Some(print(&node)?);
            }
            "SelectMany" => {
                if position != 0 {
                    return Err(self.out_of_order(call, "must be applied directly to the source"));
                }
                let lambda = self.lambda_arg(call)?;
                let node = self
                    .compiler
                    .rewrite(lambda, RootMode::Sequence, Some(&self.element_type))?;
                if let Some(element) = node.ty().element_type() {
                    self.element_type = element.clone();
                }
                self.params.select_many = Some(print(&node)?);
            }
            name @ ("OrderBy" | "OrderByDescending" | "ThenBy" | "ThenByDescending") => {
                if paged {
                    return Err(self.out_of_order(call, "cannot follow Take or Skip"));
                }
                let then = name.starts_with("Then");
                if then && self.params.order_by.is_empty() {
                    return Err(self.out_of_order(call, "requires a preceding OrderBy"));
                }
                if !then {
                    self.params.order_by.clear();
                }
                let lambda = self.lambda_arg(call)?;
                let expression = self.key(lambda)?;
                self.params.order_by.push(OrderByItem {
                    expression,
                    descending: name.ends_with("Descending"),
                });
            }
            "Take" => {
                let count = self.count_arg(call)?;
                self.params.top = Some(self.params.top.map_or(count, |top| top.min(count)));
            }
            "Skip" => {
                if self.params.top.is_some() {
                    return Err(self.out_of_order(call, "cannot follow Take"));
                }
                let count = self.count_arg(call)?;
                let skip = self.params.skip.unwrap_or(0).checked_add(count).ok_or_else(|| {
                    CompileError::invalid_argument(RQ0100, "Skip count overflows".to_string())
                })?;
                self.params.skip = Some(skip);
            }
            "Expand" => {
                let lambda = self.lambda_arg(call)?;
                let path = self.key(lambda)?;
                self.params.expand.push(path);
            }
            "ExpandShallow" => {
                let lambda = self.lambda_arg(call)?;
                let mut path = self.key(lambda)?;
                path.push(SHALLOW_SUFFIX);
                self.params.expand.push(path);
            }
            "FirstLazy" => {
                if !call.args.is_empty() {
                    return Err(CompileError::invalid_argument(
                        RQ0100,
                        "FirstLazy takes no arguments".to_string(),
                    ));
                }
                self.params.top = Some(self.params.top.map_or(1, |top| top.min(1)));
                self.terminal = Some(call.method.name.as_str());
            }
            "IncludeTotalCount" => self.params.include_total_count = true,
            other => {
                return Err(CompileError::chain(
                    RQ0200,
                    format!("Query operator {} is not supported", other),
                ));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> CompileResult<QueryParameters> {
        let combined = self
            .filters
            .into_iter()
            .reduce(|left, right| QueryNode::logical(LogicalOp::And, left, right));
        if let Some(filter) = combined {
            self.params.filter = Some(print(&filter)?);
        }
        Ok(self.params)
    }
}
