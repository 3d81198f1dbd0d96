//! Intermediate query expression tree
//!
//! Nodes are immutable once built: rewriting always produces new nodes, so a
//! finished tree can be walked by the printer, the tracker and any other pass
//! without coordination.

use crate::{Function, UnsupportedCause};
use indexmap::IndexMap;
use restq_expr::{BinaryOp, Expression, HostType, Value};
use smallvec::SmallVec;
use std::fmt;

/// Comparison operators of the filter grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOp {
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::Less => "lt",
            Self::LessOrEqual => "le",
            Self::Greater => "gt",
            Self::GreaterOrEqual => "ge",
        }
    }

    /// Map a host comparison operator
    pub const fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::Equal => Some(Self::Equal),
            BinaryOp::NotEqual => Some(Self::NotEqual),
            BinaryOp::Less => Some(Self::Less),
            BinaryOp::LessOrEqual => Some(Self::LessOrEqual),
            BinaryOp::Greater => Some(Self::Greater),
            BinaryOp::GreaterOrEqual => Some(Self::GreaterOrEqual),
            _ => None,
        }
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub const fn token(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub const fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::And => Some(Self::And),
            BinaryOp::Or => Some(Self::Or),
            _ => None,
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOp {
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "sub",
            Self::Multiply => "mul",
            Self::Divide => "div",
            Self::Modulo => "mod",
        }
    }

    pub const fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::Add => Some(Self::Add),
            BinaryOp::Subtract => Some(Self::Subtract),
            BinaryOp::Multiply => Some(Self::Multiply),
            BinaryOp::Divide => Some(Self::Divide),
            BinaryOp::Modulo => Some(Self::Modulo),
            _ => None,
        }
    }
}

/// Dotted path of resolved member names, relative to the lambda parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MemberPath {
    segments: SmallVec<[String; 4]>,
}

impl MemberPath {
    /// The lambda parameter itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the path by one segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("this");
        }
        f.write_str(&self.segments.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for MemberPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Placeholder for a sub-expression with no representation in the grammar.
///
/// An *origin* marker records where a construct was rejected. A *propagated*
/// marker replaces a parent whose children include markers; it keeps the
/// rewritten children so every origin stays reachable.
#[derive(Debug, Clone)]
pub struct UnsupportedNode {
    expression: String,
    cause: Option<UnsupportedCause>,
    nested: Vec<QueryNode>,
}

impl UnsupportedNode {
    /// Text of the original host sub-expression, abbreviated past a fixed
    /// nesting depth
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn cause(&self) -> Option<&UnsupportedCause> {
        self.cause.as_ref()
    }

    /// Rewritten children of a propagated marker
    pub fn nested(&self) -> &[QueryNode] {
        &self.nested
    }

    /// Whether this marker is where the construct was rejected
    pub fn is_origin(&self) -> bool {
        self.nested.is_empty()
    }
}

/// Query node kinds
#[derive(Debug, Clone)]
pub enum QueryKind {
    /// Resolved literal
    Constant(Value),
    /// Member path on the lambda parameter
    Member(MemberPath),
    Comparison {
        op: ComparisonOp,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    Logical {
        op: LogicalOp,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    Not(Box<QueryNode>),
    Negate(Box<QueryNode>),
    /// Allow-listed function with arguments in printed order
    Call {
        function: Function,
        args: Vec<QueryNode>,
    },
    /// Named select list in declaration order
    Projection(IndexMap<String, QueryNode>),
    /// Positional list literal
    List(Vec<QueryNode>),
    /// Value root of a selector that is not a projection
    Selector(Box<QueryNode>),
    /// The queried collection
    QuerySource,
    /// Flattening of a sequence-valued member
    SelectMany {
        source: Box<QueryNode>,
        selector: Box<QueryNode>,
    },
    Unsupported(UnsupportedNode),
}

/// A node of the intermediate query tree
#[derive(Debug, Clone)]
pub struct QueryNode {
    kind: QueryKind,
    ty: HostType,
}

impl QueryNode {
    pub fn new(kind: QueryKind, ty: HostType) -> Self {
        Self { kind, ty }
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    /// Semantic type of the value this node evaluates to
    pub fn ty(&self) -> &HostType {
        &self.ty
    }

    pub fn constant(value: Value, ty: HostType) -> Self {
        Self::new(QueryKind::Constant(value), ty)
    }

    pub fn member(path: MemberPath, ty: HostType) -> Self {
        Self::new(QueryKind::Member(path), ty)
    }

    pub fn comparison(op: ComparisonOp, left: QueryNode, right: QueryNode) -> Self {
        Self::new(
            QueryKind::Comparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            HostType::Boolean,
        )
    }

    pub fn logical(op: LogicalOp, left: QueryNode, right: QueryNode) -> Self {
        Self::new(
            QueryKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            HostType::Boolean,
        )
    }

    pub fn arithmetic(op: ArithmeticOp, left: QueryNode, right: QueryNode, ty: HostType) -> Self {
        Self::new(
            QueryKind::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn not(operand: QueryNode) -> Self {
        Self::new(QueryKind::Not(Box::new(operand)), HostType::Boolean)
    }

    pub fn negate(operand: QueryNode) -> Self {
        let ty = operand.ty.clone();
        Self::new(QueryKind::Negate(Box::new(operand)), ty)
    }

    pub fn call(function: Function, args: Vec<QueryNode>, ty: HostType) -> Self {
        Self::new(QueryKind::Call { function, args }, ty)
    }

    pub fn projection(fields: IndexMap<String, QueryNode>, ty: HostType) -> Self {
        Self::new(QueryKind::Projection(fields), ty)
    }

    pub fn list(elements: Vec<QueryNode>, ty: HostType) -> Self {
        Self::new(QueryKind::List(elements), ty)
    }

    pub fn selector(value: QueryNode) -> Self {
        let ty = value.ty.clone();
        Self::new(QueryKind::Selector(Box::new(value)), ty)
    }

    pub fn query_source(element_type: HostType) -> Self {
        Self::new(QueryKind::QuerySource, HostType::queryable(element_type))
    }

    pub fn select_many(source: QueryNode, selector: QueryNode, ty: HostType) -> Self {
        Self::new(
            QueryKind::SelectMany {
                source: Box::new(source),
                selector: Box::new(selector),
            },
            ty,
        )
    }

    /// Mark an expression as the origin of an unsupported construct
    pub fn unsupported(expression: &Expression, cause: Option<UnsupportedCause>) -> Self {
        let text = expression.to_string();
        log::debug!(
            "unsupported expression `{}`{}",
            text,
            cause
                .as_ref()
                .map(|c| format!(": {}", c))
                .unwrap_or_default()
        );
        Self::new(
            QueryKind::Unsupported(UnsupportedNode {
                expression: text,
                cause,
                nested: Vec::new(),
            }),
            expression.ty(),
        )
    }

    /// Replace a parent whose children contain unsupported markers
    pub fn propagated(expression: &Expression, nested: Vec<QueryNode>) -> Self {
        Self::new(
            QueryKind::Unsupported(UnsupportedNode {
                expression: expression.to_string(),
                cause: None,
                nested,
            }),
            expression.ty(),
        )
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, QueryKind::Unsupported(_))
    }

    pub fn as_unsupported(&self) -> Option<&UnsupportedNode> {
        match &self.kind {
            QueryKind::Unsupported(node) => Some(node),
            _ => None,
        }
    }

    /// Whether this node is the boolean constant `value`
    pub fn is_bool_constant(&self, value: bool) -> bool {
        matches!(self.kind, QueryKind::Constant(Value::Boolean(b)) if b == value)
    }

    /// Child nodes in order
    pub fn children(&self) -> Vec<&QueryNode> {
        match &self.kind {
            QueryKind::Constant(_) | QueryKind::Member(_) | QueryKind::QuerySource => Vec::new(),
            QueryKind::Comparison { left, right, .. }
            | QueryKind::Logical { left, right, .. }
            | QueryKind::Arithmetic { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            QueryKind::Not(operand) | QueryKind::Negate(operand) | QueryKind::Selector(operand) => {
                vec![operand.as_ref()]
            }
            QueryKind::Call { args, .. } => args.iter().collect(),
            QueryKind::Projection(fields) => fields.values().collect(),
            QueryKind::List(elements) => elements.iter().collect(),
            QueryKind::SelectMany { source, selector } => vec![source.as_ref(), selector.as_ref()],
            QueryKind::Unsupported(node) => node.nested.iter().collect(),
        }
    }
}
