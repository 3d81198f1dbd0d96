//! Node classification
//!
//! Maps each host expression node onto the closed set of query node kinds.
//! Classification looks at one node at a time and never fails: anything the
//! grammar cannot express comes back as [`NodeKind::Unsupported`].

use crate::functions::{self, Access, Lookup, Receiver};
use crate::query::{ArithmeticOp, ComparisonOp, LogicalOp};
use crate::{CompilerOptions, FunctionSignature, UnsupportedCause};
use restq_expr::{
    BinaryExpr, Expression, HostType, IndexExpr, MemberAccess, MethodCall, Parameter, UnaryOp,
};
use restq_types::MetadataCache;

/// Query node kinds a host node can lower to
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Literal constant
    Constant,
    /// Parameter-free sub-expression to evaluate into a literal
    Foldable,
    /// Root of a query chain
    QuerySource,
    /// The lambda parameter itself
    Parameter,
    /// Mapped member on a path rooted at the parameter
    MemberPath,
    /// Dictionary lookup with a string key, printed as a path segment
    DictionaryIndex,
    Comparison(ComparisonOp),
    Logical(LogicalOp),
    Arithmetic(ArithmeticOp),
    /// `+` on text, lowered to `concat`
    StringConcat,
    Not,
    Negate,
    /// Conversion or boxing wrapper, transparent to filtering
    Conversion,
    /// `nullable.HasValue`, lowered to a `ne null` test
    HasValue,
    /// Allow-listed method or property
    FunctionCall(&'static FunctionSignature),
    /// Anonymous-type, tuple or list construction
    Projection,
    Unsupported(Option<UnsupportedCause>),
}

/// Classifies nodes of a lambda body
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    cache: &'a MetadataCache,
    options: &'a CompilerOptions,
    parameter: &'a Parameter,
}

impl<'a> Classifier<'a> {
    pub fn new(cache: &'a MetadataCache, options: &'a CompilerOptions, parameter: &'a Parameter) -> Self {
        Self {
            cache,
            options,
            parameter,
        }
    }

    pub fn cache(&self) -> &'a MetadataCache {
        self.cache
    }

    pub fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    /// The lambda parameter member paths are rooted at
    pub fn parameter(&self) -> &'a Parameter {
        self.parameter
    }

    /// Classify a single node
    pub fn classify(&self, expr: &Expression) -> NodeKind {
        match expr {
            Expression::Constant(_) => return NodeKind::Constant,
            Expression::QuerySource(_) => return NodeKind::QuerySource,
            Expression::Lambda(_) => return NodeKind::Unsupported(None),
            _ => {}
        }

        if !expr.has_free_parameters() {
            return NodeKind::Foldable;
        }

        match expr {
            Expression::Parameter(p) if p.name == self.parameter.name => NodeKind::Parameter,
            Expression::Parameter(p) => NodeKind::Unsupported(Some(UnsupportedCause::ForeignParameter {
                name: p.name.clone(),
            })),
            Expression::Unary(u) => match u.op {
                UnaryOp::Not => NodeKind::Not,
                UnaryOp::Negate => NodeKind::Negate,
                UnaryOp::Convert => NodeKind::Conversion,
            },
            Expression::Binary(b) => self.classify_binary(b),
            Expression::Member(m) => self.classify_member(m),
            Expression::Call(c) => self.classify_call(c),
            Expression::Index(i) => self.classify_index(i),
            Expression::New(n) if self.is_projection_shape(&n.ty) => NodeKind::Projection,
            Expression::ListInit(_) => NodeKind::Projection,
            Expression::New(_) | Expression::Conditional(_) => NodeKind::Unsupported(None),
            Expression::Constant(_) | Expression::QuerySource(_) | Expression::Lambda(_) => {
                NodeKind::Unsupported(None)
            }
        }
    }

    /// Whether constructing `ty` denotes a projection
    pub fn is_projection_shape(&self, ty: &HostType) -> bool {
        self.cache
            .type_metadata(ty)
            .is_some_and(|meta| meta.is_projection_shape())
    }

    fn classify_binary(&self, b: &BinaryExpr) -> NodeKind {
        let unsupported_operator = || {
            NodeKind::Unsupported(Some(UnsupportedCause::UnsupportedOperator {
                operator: b.op.symbol().to_string(),
            }))
        };

        if let Some(op) = LogicalOp::from_binary(b.op) {
            return NodeKind::Logical(op);
        }
        if let Some(op) = ComparisonOp::from_binary(b.op) {
            if b.op.is_ordering() && !self.options.ordering_comparisons {
                return unsupported_operator();
            }
            return NodeKind::Comparison(op);
        }
        match ArithmeticOp::from_binary(b.op) {
            Some(_) if !self.options.arithmetic => unsupported_operator(),
            Some(ArithmeticOp::Add) if b.ty.is_text() || b.left.ty().is_text() => NodeKind::StringConcat,
            Some(op) => NodeKind::Arithmetic(op),
            None => unsupported_operator(),
        }
    }

    fn classify_member(&self, m: &MemberAccess) -> NodeKind {
        let declaring_type = &m.declaring_type;
        // `nullable.Value` unwraps like a conversion
        if matches!(declaring_type, HostType::Nullable(_)) && m.target.is_some() {
            match m.name.as_str() {
                "Value" => return NodeKind::Conversion,
                "HasValue" => return NodeKind::HasValue,
                _ => {}
            }
        }
        if let Some(receiver) = Receiver::of(declaring_type) {
            return match functions::lookup(receiver, &m.name, Access::Property, &[]) {
                Lookup::Found(sig) => NodeKind::FunctionCall(sig),
                _ => NodeKind::Unsupported(Some(UnsupportedCause::UnknownMember {
                    declaring_type: declaring_type.type_name(),
                    member: m.name.clone(),
                })),
            };
        }

        if matches!(declaring_type.underlying(), HostType::Dictionary(..)) || m.target.is_none() {
            return NodeKind::Unsupported(Some(UnsupportedCause::UnknownMember {
                declaring_type: declaring_type.type_name(),
                member: m.name.clone(),
            }));
        }

        if !self.cache.property(declaring_type, &m.name).mapped {
            return NodeKind::Unsupported(Some(UnsupportedCause::UnmappedMember {
                declaring_type: declaring_type.type_name(),
                member: m.name.clone(),
            }));
        }

        NodeKind::MemberPath
    }

    fn classify_call(&self, c: &MethodCall) -> NodeKind {
        let declaring_type = &c.method.declaring_type;
        let unknown = || {
            NodeKind::Unsupported(Some(UnsupportedCause::UnknownMethod {
                declaring_type: declaring_type.type_name(),
                method: c.method.name.clone(),
            }))
        };

        let Some(receiver) = Receiver::of(declaring_type) else {
            return unknown();
        };
        let access = if c.target.is_some() {
            Access::Instance
        } else {
            Access::Static
        };
        let arg_types: Vec<HostType> = c.args.iter().map(Expression::ty).collect();

        match functions::lookup(receiver, &c.method.name, access, &arg_types) {
            Lookup::Found(sig) => NodeKind::FunctionCall(sig),
            Lookup::Mismatch { function, message } => {
                NodeKind::Unsupported(Some(UnsupportedCause::ArityOrTypeMismatch {
                    function: function.name().to_string(),
                    message,
                }))
            }
            Lookup::Unknown => unknown(),
        }
    }

    fn classify_index(&self, i: &IndexExpr) -> NodeKind {
        let target_type = i.target.ty();
        let string_keyed = matches!(
            target_type.underlying(),
            HostType::Dictionary(key, _) if key.is_text()
        );

        match i.args.as_slice() {
            [key] if string_keyed && key.ty().is_text() => {
                if key.has_free_parameters() {
                    NodeKind::Unsupported(Some(UnsupportedCause::NonLiteralKey {
                        key: key.to_string(),
                    }))
                } else {
                    NodeKind::DictionaryIndex
                }
            }
            _ => NodeKind::Unsupported(Some(UnsupportedCause::UnsupportedIndexer {
                ty: target_type.type_name(),
            })),
        }
    }
}
