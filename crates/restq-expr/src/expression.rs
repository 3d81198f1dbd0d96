//! Host expression tree nodes
//!
//! This module defines the closed set of node shapes a host may hand to the
//! query compiler, plus fluent constructors for building trees in code.

use crate::{BinaryOp, BoxExpr, HostFunction, HostType, ObjectValue, UnaryOp, Value};

/// All host expression node kinds
#[derive(Debug, Clone)]
pub enum Expression {
    /// Lambda (root of a predicate, selector or query-operator argument)
    Lambda(Lambda),
    /// Reference to a lambda parameter
    Parameter(Parameter),
    /// Constant value (literal or captured closure object)
    Constant(Constant),
    /// Field or property access
    Member(MemberAccess),
    /// Unary operation
    Unary(UnaryExpr),
    /// Binary operation
    Binary(BinaryExpr),
    /// Method invocation
    Call(MethodCall),
    /// Indexer access (`target[key]`)
    Index(IndexExpr),
    /// Object construction
    New(NewExpr),
    /// Collection literal
    ListInit(ListInitExpr),
    /// Conditional (`test ? a : b`)
    Conditional(ConditionalExpr),
    /// Root of a server-side query chain
    QuerySource(QuerySource),
}

/// A lambda expression
#[derive(Debug, Clone)]
pub struct Lambda {
    /// Declared parameters
    pub parameters: Vec<Parameter>,
    /// Body expression
    pub body: BoxExpr,
}

impl Lambda {
    /// Create a unary lambda
    pub fn new(parameter: Parameter, body: Expression) -> Self {
        Self {
            parameters: vec![parameter],
            body: Box::new(body),
        }
    }

    /// The single parameter of a unary lambda
    pub fn parameter(&self) -> Option<&Parameter> {
        match self.parameters.as_slice() {
            [param] => Some(param),
            _ => None,
        }
    }

    /// Type of the body
    pub fn return_type(&self) -> HostType {
        self.body.ty()
    }
}

/// A lambda parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub ty: HostType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: HostType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Reference this parameter as an expression
    pub fn to_expr(&self) -> Expression {
        Expression::Parameter(self.clone())
    }
}

/// A constant with its declared type
#[derive(Debug, Clone)]
pub struct Constant {
    pub value: Value,
    pub ty: HostType,
}

/// Member (field/property) access
#[derive(Debug, Clone)]
pub struct MemberAccess {
    /// Target object; `None` for static members
    pub target: Option<BoxExpr>,
    /// Type declaring the member
    pub declaring_type: HostType,
    /// Member name as declared
    pub name: String,
    /// Member type
    pub ty: HostType,
}

/// Unary operation expression
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: BoxExpr,
    /// Result type (target type for conversions)
    pub ty: HostType,
}

/// Binary operation expression
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: BoxExpr,
    pub op: BinaryOp,
    pub right: BoxExpr,
    pub ty: HostType,
}

/// Reference to a host method
#[derive(Debug, Clone)]
pub struct MethodRef {
    /// Type declaring the method
    pub declaring_type: HostType,
    /// Method name as declared
    pub name: String,
    /// Host implementation, used when the call can be folded to a constant
    pub host: Option<HostFunction>,
}

/// Method invocation
#[derive(Debug, Clone)]
pub struct MethodCall {
    /// Instance target; `None` for static methods
    pub target: Option<BoxExpr>,
    pub method: MethodRef,
    pub args: Vec<Expression>,
    /// Return type
    pub ty: HostType,
}

/// Indexer access
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub target: BoxExpr,
    pub args: Vec<Expression>,
    pub ty: HostType,
}

/// Object construction
#[derive(Debug, Clone)]
pub struct NewExpr {
    /// Constructed type
    pub ty: HostType,
    /// Constructor arguments in order
    pub args: Vec<Expression>,
    /// Member names bound to each argument, when the host records them
    pub members: Option<Vec<String>>,
}

/// Collection literal
#[derive(Debug, Clone)]
pub struct ListInitExpr {
    pub ty: HostType,
    pub elements: Vec<Expression>,
}

/// Conditional expression
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub test: BoxExpr,
    pub if_true: BoxExpr,
    pub if_false: BoxExpr,
    pub ty: HostType,
}

/// Root of a query chain over a server-side resource collection
#[derive(Debug, Clone)]
pub struct QuerySource {
    pub element_type: HostType,
}

impl Expression {
    /// Get the semantic type of this node
    pub fn ty(&self) -> HostType {
        match self {
            Self::Lambda(lambda) => lambda.return_type(),
            Self::Parameter(p) => p.ty.clone(),
            Self::Constant(c) => c.ty.clone(),
            Self::Member(m) => m.ty.clone(),
            Self::Unary(u) => u.ty.clone(),
            Self::Binary(b) => b.ty.clone(),
            Self::Call(c) => c.ty.clone(),
            Self::Index(i) => i.ty.clone(),
            Self::New(n) => n.ty.clone(),
            Self::ListInit(l) => l.ty.clone(),
            Self::Conditional(c) => c.ty.clone(),
            Self::QuerySource(q) => HostType::queryable(q.element_type.clone()),
        }
    }

    // === Leaf constructors ===

    /// Create a parameter reference
    pub fn param(name: impl Into<String>, ty: HostType) -> Self {
        Self::Parameter(Parameter::new(name, ty))
    }

    /// Create a constant typed by its value
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.host_type();
        Self::Constant(Constant { value, ty })
    }

    /// Create a constant with an explicit declared type
    pub fn typed_constant(value: impl Into<Value>, ty: HostType) -> Self {
        Self::Constant(Constant {
            value: value.into(),
            ty,
        })
    }

    /// Create a null constant of the given type
    pub fn null(ty: HostType) -> Self {
        Self::typed_constant(Value::Null, ty)
    }

    /// Create a captured closure object
    pub fn closure(object: ObjectValue) -> Self {
        Self::constant(object)
    }

    /// Create a unary lambda
    pub fn lambda(parameter: Parameter, body: Expression) -> Self {
        Self::Lambda(Lambda::new(parameter, body))
    }

    /// Create a query source over the given element type
    pub fn query_source(element_type: HostType) -> Self {
        Self::QuerySource(QuerySource { element_type })
    }

    // === Member access and calls ===

    /// Access an instance member declared on this expression's type
    pub fn member(self, name: impl Into<String>, ty: HostType) -> Self {
        let declaring_type = self.ty();
        Self::Member(MemberAccess {
            target: Some(Box::new(self)),
            declaring_type,
            name: name.into(),
            ty,
        })
    }

    /// Access a static member
    pub fn static_member(declaring_type: HostType, name: impl Into<String>, ty: HostType) -> Self {
        Self::Member(MemberAccess {
            target: None,
            declaring_type,
            name: name.into(),
            ty,
        })
    }

    /// Call an instance method declared on this expression's type
    pub fn call(self, name: impl Into<String>, args: Vec<Expression>, ty: HostType) -> Self {
        let declaring_type = self.ty();
        Self::Call(MethodCall {
            target: Some(Box::new(self)),
            method: MethodRef {
                declaring_type,
                name: name.into(),
                host: None,
            },
            args,
            ty,
        })
    }

    /// Call an instance method with a host implementation
    pub fn call_host(
        self,
        name: impl Into<String>,
        args: Vec<Expression>,
        ty: HostType,
        host: HostFunction,
    ) -> Self {
        let declaring_type = self.ty();
        Self::Call(MethodCall {
            target: Some(Box::new(self)),
            method: MethodRef {
                declaring_type,
                name: name.into(),
                host: Some(host),
            },
            args,
            ty,
        })
    }

    /// Call a static method
    pub fn static_call(
        declaring_type: HostType,
        name: impl Into<String>,
        args: Vec<Expression>,
        ty: HostType,
    ) -> Self {
        Self::Call(MethodCall {
            target: None,
            method: MethodRef {
                declaring_type,
                name: name.into(),
                host: None,
            },
            args,
            ty,
        })
    }

    /// Index into this expression
    pub fn index(self, key: Expression, ty: HostType) -> Self {
        Self::Index(IndexExpr {
            target: Box::new(self),
            args: vec![key],
            ty,
        })
    }

    /// Chain a query operator onto this query expression
    pub fn query_op(self, name: impl Into<String>, args: Vec<Expression>) -> Self {
        let ty = self.ty();
        self.call(name, args, ty)
    }

    // === Operators ===

    fn binary(self, op: BinaryOp, right: Expression, ty: HostType) -> Self {
        Self::Binary(BinaryExpr {
            left: Box::new(self),
            op,
            right: Box::new(right),
            ty,
        })
    }

    fn comparison(self, op: BinaryOp, right: Expression) -> Self {
        self.binary(op, right, HostType::Boolean)
    }

    fn arithmetic(self, op: BinaryOp, right: Expression) -> Self {
        let ty = self.ty();
        self.binary(op, right, ty)
    }

    pub fn equal(self, right: Expression) -> Self {
        self.comparison(BinaryOp::Equal, right)
    }

    pub fn not_equal(self, right: Expression) -> Self {
        self.comparison(BinaryOp::NotEqual, right)
    }

    pub fn less(self, right: Expression) -> Self {
        self.comparison(BinaryOp::Less, right)
    }

    pub fn less_or_equal(self, right: Expression) -> Self {
        self.comparison(BinaryOp::LessOrEqual, right)
    }

    pub fn greater(self, right: Expression) -> Self {
        self.comparison(BinaryOp::Greater, right)
    }

    pub fn greater_or_equal(self, right: Expression) -> Self {
        self.comparison(BinaryOp::GreaterOrEqual, right)
    }

    pub fn and_also(self, right: Expression) -> Self {
        self.comparison(BinaryOp::And, right)
    }

    pub fn or_else(self, right: Expression) -> Self {
        self.comparison(BinaryOp::Or, right)
    }

    pub fn plus(self, right: Expression) -> Self {
        self.arithmetic(BinaryOp::Add, right)
    }

    pub fn minus(self, right: Expression) -> Self {
        self.arithmetic(BinaryOp::Subtract, right)
    }

    pub fn times(self, right: Expression) -> Self {
        self.arithmetic(BinaryOp::Multiply, right)
    }

    pub fn divided_by(self, right: Expression) -> Self {
        self.arithmetic(BinaryOp::Divide, right)
    }

    pub fn modulo(self, right: Expression) -> Self {
        self.arithmetic(BinaryOp::Modulo, right)
    }

    /// Logical negation
    pub fn logical_not(self) -> Self {
        Self::Unary(UnaryExpr {
            op: UnaryOp::Not,
            operand: Box::new(self),
            ty: HostType::Boolean,
        })
    }

    /// Arithmetic negation
    pub fn negate(self) -> Self {
        let ty = self.ty();
        Self::Unary(UnaryExpr {
            op: UnaryOp::Negate,
            operand: Box::new(self),
            ty,
        })
    }

    /// Convert (or box) to another type
    pub fn convert(self, ty: HostType) -> Self {
        Self::Unary(UnaryExpr {
            op: UnaryOp::Convert,
            operand: Box::new(self),
            ty,
        })
    }

    /// Conditional expression
    pub fn conditional(test: Expression, if_true: Expression, if_false: Expression) -> Self {
        let ty = if_true.ty();
        Self::Conditional(ConditionalExpr {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            ty,
        })
    }

    // === Construction ===

    /// Construct an anonymous record with named members
    pub fn new_anonymous<S: Into<String>>(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = (S, Expression)>,
    ) -> Self {
        let (members, args): (Vec<String>, Vec<Expression>) = fields
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .unzip();
        Self::New(NewExpr {
            ty: HostType::Anonymous(type_name.into()),
            args,
            members: Some(members),
        })
    }

    /// Construct a positional tuple
    pub fn new_tuple(args: Vec<Expression>) -> Self {
        let ty = HostType::Tuple(args.iter().map(Expression::ty).collect());
        Self::New(NewExpr {
            ty,
            args,
            members: None,
        })
    }

    /// Construct an object of an arbitrary type
    pub fn new_object(ty: HostType, args: Vec<Expression>) -> Self {
        Self::New(NewExpr {
            ty,
            args,
            members: None,
        })
    }

    /// Collection literal
    pub fn list(element_type: HostType, elements: Vec<Expression>) -> Self {
        Self::ListInit(ListInitExpr {
            ty: HostType::list(element_type),
            elements,
        })
    }

    // === Inspection ===

    /// Strip conversion wrappers, which carry no weight for filtering
    pub fn strip_conversions(&self) -> &Expression {
        let mut current = self;
        while let Self::Unary(UnaryExpr {
            op: UnaryOp::Convert,
            operand,
            ..
        }) = current
        {
            current = operand;
        }
        current
    }

    /// Whether the tree contains any parameter reference at all.
    ///
    /// Nested lambdas count as references. The walk keeps an explicit stack
    /// so arbitrarily deep trees are safe to inspect.
    pub fn has_free_parameters(&self) -> bool {
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Self::Parameter(_) | Self::Lambda(_) => return true,
                _ => expr.visit_children(|child| pending.push(child)),
            }
        }
        false
    }

    /// Call `f` on each direct child, left to right
    fn visit_children<'a>(&'a self, mut f: impl FnMut(&'a Expression)) {
        match self {
            Self::Parameter(_) | Self::Constant(_) | Self::QuerySource(_) => {}
            Self::Lambda(lambda) => f(&lambda.body),
            Self::Member(m) => {
                if let Some(target) = &m.target {
                    f(target);
                }
            }
            Self::Unary(u) => f(&u.operand),
            Self::Binary(b) => {
                f(&b.left);
                f(&b.right);
            }
            Self::Call(c) => {
                if let Some(target) = &c.target {
                    f(target);
                }
                c.args.iter().for_each(f);
            }
            Self::Index(i) => {
                f(&i.target);
                i.args.iter().for_each(f);
            }
            Self::New(n) => n.args.iter().for_each(f),
            Self::ListInit(l) => l.elements.iter().for_each(f),
            Self::Conditional(c) => {
                f(&c.test);
                f(&c.if_true);
                f(&c.if_false);
            }
        }
    }

    /// Move the direct children out, leaving leaf placeholders behind
    fn detach_children(&mut self, out: &mut Vec<Expression>) {
        fn take(slot: &mut BoxExpr, out: &mut Vec<Expression>) {
            out.push(std::mem::replace(&mut **slot, Expression::null(HostType::Object)));
        }

        match self {
            Self::Parameter(_) | Self::Constant(_) | Self::QuerySource(_) => {}
            Self::Lambda(lambda) => take(&mut lambda.body, out),
            Self::Member(m) => {
                if let Some(target) = &mut m.target {
                    take(target, out);
                }
            }
            Self::Unary(u) => take(&mut u.operand, out),
            Self::Binary(b) => {
                take(&mut b.left, out);
                take(&mut b.right, out);
            }
            Self::Call(c) => {
                if let Some(target) = &mut c.target {
                    take(target, out);
                }
                out.append(&mut c.args);
            }
            Self::Index(i) => {
                take(&mut i.target, out);
                out.append(&mut i.args);
            }
            Self::New(n) => out.append(&mut n.args),
            Self::ListInit(l) => out.append(&mut l.elements),
            Self::Conditional(c) => {
                take(&mut c.test, out);
                take(&mut c.if_true, out);
                take(&mut c.if_false, out);
            }
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Parameter(_) | Self::Constant(_) | Self::QuerySource(_)
        )
    }
}

// Dropping a deep tree recursively would overflow the stack
impl Drop for Expression {
    fn drop(&mut self) {
        if self.is_leaf() {
            return;
        }
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            if !expr.is_leaf() {
                expr.detach_children(&mut pending);
            }
        }
    }
}

impl From<Parameter> for Expression {
    fn from(p: Parameter) -> Self {
        Self::Parameter(p)
    }
}

impl From<Lambda> for Expression {
    fn from(l: Lambda) -> Self {
        Self::Lambda(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> HostType {
        HostType::named("TestResource")
    }

    #[test]
    fn test_member_records_declaring_type() {
        let x = Expression::param("x", resource());
        let expr = x.member("Jalla", HostType::String);
        match &expr {
            Expression::Member(m) => {
                assert_eq!(m.declaring_type, resource());
                assert_eq!(m.name, "Jalla");
            }
            other => panic!("Expected member access, got {:?}", other),
        }
        assert_eq!(expr.ty(), HostType::String);
    }

    #[test]
    fn test_parameter_dependency() {
        let x = Parameter::new("x", resource());
        let outer = Expression::closure(ObjectValue::new("Container").with_field("Junk", "Kirk"))
            .member("Junk", HostType::String);
        assert!(!outer.has_free_parameters());

        let cmp = x.to_expr().member("Jalla", HostType::String).equal(outer);
        assert!(cmp.has_free_parameters());
        assert_eq!(cmp.ty(), HostType::Boolean);
    }

    #[test]
    fn test_strip_conversions() {
        let inner = Expression::constant(5);
        let wrapped = inner
            .convert(HostType::nullable(HostType::Int32))
            .convert(HostType::Object);
        assert!(matches!(wrapped.strip_conversions(), Expression::Constant(_)));
    }

    #[test]
    fn test_new_anonymous_preserves_member_order() {
        let x = Expression::param("x", resource());
        let expr = Expression::new_anonymous(
            "<>f__AnonymousType0",
            [
                ("B", x.clone().member("Bar", HostType::String)),
                ("A", x.member("Foo", HostType::String)),
            ],
        );
        match &expr {
            Expression::New(n) => {
                assert_eq!(n.members, Some(vec!["B".to_string(), "A".to_string()]));
                assert_eq!(n.args.len(), 2);
            }
            other => panic!("Expected new, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_tree_inspect_and_drop() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut expr = Expression::param("x", resource()).member("Flag", HostType::Boolean);
                for _ in 0..100_000 {
                    expr = expr.logical_not().convert(HostType::Boolean);
                }
                assert!(expr.has_free_parameters());
                assert!(matches!(expr.strip_conversions(), Expression::Unary(_)));
            })
            .unwrap();
        handle.join().unwrap();
    }
}
