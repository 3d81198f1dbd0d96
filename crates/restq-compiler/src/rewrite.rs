//! Tree rewriting
//!
//! Walks a lambda body and builds the intermediate query tree bottom-up.
//! Children are rewritten before their parent; a parent with an unsupported
//! child becomes a propagated marker instead of a half-printable node.

use crate::classify::{Classifier, NodeKind};
use crate::fold;
use crate::literal::format_literal;
use crate::projection;
use crate::query::{ComparisonOp, MemberPath, QueryKind, QueryNode};
use crate::functions::ReceiverPosition;
use crate::{CompilerOptions, EvalError, Function, FunctionSignature, UnsupportedCause};
use restq_expr::{Expression, Lambda, MemberAccess, MethodCall, Value};
use restq_types::MetadataCache;

/// How the root of a lambda body is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMode {
    /// Bare value: predicates and ordering keys
    Value,
    /// Select root; non-projection values print as `<value> as this`
    Selector,
    /// Sequence-valued selector of a `SelectMany`
    Sequence,
}

/// Rewrites one unary lambda into a query tree
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    classifier: Classifier<'a>,
    lambda: &'a Lambda,
    mode: RootMode,
}

impl<'a> Rewriter<'a> {
    /// Create a rewriter for a unary lambda; `None` when the lambda takes
    /// zero or several parameters
    pub fn new(
        cache: &'a MetadataCache,
        options: &'a CompilerOptions,
        lambda: &'a Lambda,
        mode: RootMode,
    ) -> Option<Self> {
        let parameter = lambda.parameter()?;
        Some(Self {
            classifier: Classifier::new(cache, options, parameter),
            lambda,
            mode,
        })
    }

    pub fn classifier(&self) -> &Classifier<'a> {
        &self.classifier
    }

    /// Rewrite the lambda body
    pub fn rewrite(&self) -> QueryNode {
        let body = self.lambda.body.as_ref();

        match body.strip_conversions() {
            Expression::New(new) if self.classifier.is_projection_shape(&new.ty) => {
                return projection::build_projection(self, new, body, 1);
            }
            Expression::ListInit(list) if self.mode != RootMode::Sequence => {
                return projection::build_list(self, list, body, 1);
            }
            _ => {}
        }

        let node = self.rewrite_at(body, 0);
        match self.mode {
            RootMode::Value => node,
            RootMode::Selector => QueryNode::selector(node),
            RootMode::Sequence => {
                let source = QueryNode::query_source(self.classifier.parameter().ty.clone());
                let ty = node.ty().clone();
                QueryNode::select_many(source, node, ty)
            }
        }
    }

    pub(crate) fn rewrite_at(&self, expr: &Expression, depth: usize) -> QueryNode {
        let max_depth = self.classifier.options().max_depth;
        if depth > max_depth {
            return QueryNode::unsupported(expr, Some(UnsupportedCause::DepthExceeded { max: max_depth }));
        }
        let depth = depth + 1;

        match self.classifier.classify(expr) {
            NodeKind::Constant => match expr {
                Expression::Constant(c) => self.literal(expr, c.value.clone()),
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::Foldable => self.fold(expr, depth),
            NodeKind::QuerySource => match expr {
                Expression::QuerySource(q) => QueryNode::query_source(q.element_type.clone()),
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::Parameter => QueryNode::member(MemberPath::root(), expr.ty()),
            NodeKind::Conversion => match expr {
                Expression::Unary(u) => self.rewrite_at(&u.operand, depth),
                Expression::Member(MemberAccess {
                    target: Some(target),
                    ..
                }) => self.rewrite_at(target, depth),
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::HasValue => match expr {
                Expression::Member(MemberAccess {
                    target: Some(target),
                    declaring_type,
                    ..
                }) => {
                    let target = self.rewrite_at(target, depth);
                    if target.is_unsupported() {
                        return QueryNode::propagated(expr, vec![target]);
                    }
                    let null = QueryNode::constant(Value::Null, declaring_type.clone());
                    QueryNode::comparison(ComparisonOp::NotEqual, target, null)
                }
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::Comparison(op) => self.binary(expr, depth, |l, r| QueryNode::comparison(op, l, r)),
            NodeKind::Logical(op) => self.binary(expr, depth, |l, r| QueryNode::logical(op, l, r)),
            NodeKind::Arithmetic(op) => {
                let ty = expr.ty();
                self.binary(expr, depth, |l, r| QueryNode::arithmetic(op, l, r, ty))
            }
            NodeKind::StringConcat => {
                let ty = expr.ty();
                self.binary(expr, depth, |l, r| QueryNode::call(Function::Concat, vec![l, r], ty))
            }
            NodeKind::Not => self.unary(expr, depth, QueryNode::not),
            NodeKind::Negate => self.unary(expr, depth, QueryNode::negate),
            NodeKind::MemberPath => match expr {
                Expression::Member(m) => self.member(expr, m, depth),
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::DictionaryIndex => self.dictionary_index(expr, depth),
            NodeKind::FunctionCall(sig) => self.function(expr, sig, depth),
            NodeKind::Projection => match expr {
                Expression::ListInit(list) => projection::build_list(self, list, expr, depth),
                // Nested record construction has no grammar form
                _ => QueryNode::unsupported(expr, None),
            },
            NodeKind::Unsupported(cause) => QueryNode::unsupported(expr, cause),
        }
    }

    fn literal(&self, expr: &Expression, value: Value) -> QueryNode {
        match format_literal(&value) {
            Ok(_) => QueryNode::constant(value, expr.ty()),
            Err(err) => QueryNode::unsupported(expr, Some(err.into())),
        }
    }

    fn fold(&self, expr: &Expression, depth: usize) -> QueryNode {
        match self.evaluate(expr, depth) {
            Ok(value) => self.literal(expr, value),
            Err(err) => {
                log::debug!("constant folding of `{}` failed: {}", expr, err);
                QueryNode::unsupported(expr, Some(err))
            }
        }
    }

    /// Fold within what is left of the nesting budget
    fn evaluate(&self, expr: &Expression, depth: usize) -> Result<Value, UnsupportedCause> {
        let max_depth = self.classifier.options().max_depth;
        fold::evaluate_within(expr, max_depth.saturating_sub(depth)).map_err(|err| match err {
            EvalError::DepthExceeded => UnsupportedCause::DepthExceeded { max: max_depth },
            other => other.into(),
        })
    }

    fn binary(
        &self,
        expr: &Expression,
        depth: usize,
        build: impl FnOnce(QueryNode, QueryNode) -> QueryNode,
    ) -> QueryNode {
        let Expression::Binary(b) = expr else {
            return QueryNode::unsupported(expr, None);
        };
        let left = self.rewrite_at(&b.left, depth);
        let right = self.rewrite_at(&b.right, depth);
        if left.is_unsupported() || right.is_unsupported() {
            return QueryNode::propagated(expr, vec![left, right]);
        }
        build(left, right)
    }

    fn unary(&self, expr: &Expression, depth: usize, build: impl FnOnce(QueryNode) -> QueryNode) -> QueryNode {
        let Expression::Unary(u) = expr else {
            return QueryNode::unsupported(expr, None);
        };
        let operand = self.rewrite_at(&u.operand, depth);
        if operand.is_unsupported() {
            return QueryNode::propagated(expr, vec![operand]);
        }
        build(operand)
    }

    fn member(&self, expr: &Expression, m: &MemberAccess, depth: usize) -> QueryNode {
        let Some(target) = &m.target else {
            return QueryNode::unsupported(expr, None);
        };
        let target = self.rewrite_at(target, depth);
        match target.kind() {
            QueryKind::Member(path) => {
                let mapping = self.classifier.cache().property(&m.declaring_type, &m.name);
                QueryNode::member(path.child(mapping.name.as_str()), m.ty.clone())
            }
            QueryKind::Unsupported(_) => QueryNode::propagated(expr, vec![target]),
            // Members of computed values are not paths
            _ => QueryNode::unsupported(expr, None),
        }
    }

    fn dictionary_index(&self, expr: &Expression, depth: usize) -> QueryNode {
        let Expression::Index(index) = expr else {
            return QueryNode::unsupported(expr, None);
        };
        let [key] = index.args.as_slice() else {
            return QueryNode::unsupported(expr, None);
        };

        let key = match self.evaluate(key, depth) {
            Ok(Value::String(key)) => key,
            Ok(Value::Char(c)) => c.to_string(),
            Ok(_) => {
                return QueryNode::unsupported(
                    expr,
                    Some(UnsupportedCause::NonLiteralKey {
                        key: key.to_string(),
                    }),
                );
            }
            Err(err) => return QueryNode::unsupported(expr, Some(err)),
        };

        let target = self.rewrite_at(&index.target, depth);
        match target.kind() {
            QueryKind::Member(path) if !path.is_root() => QueryNode::member(path.child(key), index.ty.clone()),
            QueryKind::Unsupported(_) => QueryNode::propagated(expr, vec![target]),
            _ => QueryNode::unsupported(expr, None),
        }
    }

    fn function(&self, expr: &Expression, sig: &FunctionSignature, depth: usize) -> QueryNode {
        let (receiver, args): (Option<&Expression>, &[Expression]) = match expr {
            Expression::Member(m) => (m.target.as_deref(), &[]),
            Expression::Call(MethodCall { target, args, .. }) => (target.as_deref(), args.as_slice()),
            _ => return QueryNode::unsupported(expr, None),
        };

        let receiver = receiver.map(|r| self.rewrite_at(r, depth));
        let mut args: Vec<QueryNode> = args.iter().map(|a| self.rewrite_at(a, depth)).collect();

        let failed = receiver.as_ref().is_some_and(QueryNode::is_unsupported)
            || args.iter().any(QueryNode::is_unsupported);
        if failed {
            let mut nested: Vec<QueryNode> = receiver.into_iter().collect();
            nested.extend(args);
            return QueryNode::propagated(expr, nested);
        }

        match (sig.position, receiver) {
            (ReceiverPosition::First, Some(receiver)) => args.insert(0, receiver),
            (ReceiverPosition::Last, Some(receiver)) => args.push(receiver),
            (ReceiverPosition::None, None) => {}
            _ => return QueryNode::unsupported(expr, None),
        }

        QueryNode::call(sig.function, args, expr.ty())
    }
}
