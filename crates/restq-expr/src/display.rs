//! Textual rendering of host expressions
//!
//! Used to report the original sub-expression behind an unsupported node.

use crate::{Expression, UnaryOp, Value};
use std::fmt::{self, Display, Formatter};

/// Nesting depth past which sub-expressions render as `...`
const MAX_RENDER_DEPTH: usize = 32;

/// An expression rendered at a given nesting depth
struct Render<'a> {
    expr: &'a Expression,
    depth: usize,
}

impl<'a> Render<'a> {
    fn child(&self, expr: &'a Expression) -> Render<'a> {
        Render {
            expr,
            depth: self.depth + 1,
        }
    }

    fn write_list(&self, f: &mut Formatter<'_>, items: &'a [Expression]) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.child(item))?;
        }
        Ok(())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Single(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Char(c) => write!(f, "'{}'", c),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::DateTime(dt) => write!(f, "{}", dt.naive()),
            Self::Guid(g) => write!(f, "{}", g),
            Self::Object(obj) => write!(f, "value({})", obj.type_name),
            Self::List(_) => write!(f, "value(List)"),
            Self::Dictionary(_) => write!(f, "value(Dictionary)"),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Render { expr: self, depth: 0 }.fmt(f)
    }
}

impl Display for Render<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.depth > MAX_RENDER_DEPTH {
            return write!(f, "...");
        }
        match self.expr {
            Expression::Lambda(lambda) => {
                match lambda.parameters.as_slice() {
                    [param] => write!(f, "{}", param.name)?,
                    params => {
                        write!(f, "(")?;
                        for (i, p) in params.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", p.name)?;
                        }
                        write!(f, ")")?;
                    }
                }
                write!(f, " => {}", self.child(&lambda.body))
            }
            Expression::Parameter(p) => write!(f, "{}", p.name),
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::Member(m) => match &m.target {
                Some(target) => write!(f, "{}.{}", self.child(target), m.name),
                None => write!(f, "{}.{}", m.declaring_type, m.name),
            },
            Expression::Unary(u) => match u.op {
                UnaryOp::Not => write!(f, "Not({})", self.child(&u.operand)),
                UnaryOp::Negate => write!(f, "-{}", self.child(&u.operand)),
                UnaryOp::Convert => write!(f, "Convert({}, {})", self.child(&u.operand), u.ty),
            },
            Expression::Binary(b) => write!(
                f,
                "({} {} {})",
                self.child(&b.left),
                b.op.symbol(),
                self.child(&b.right)
            ),
            Expression::Call(c) => {
                match &c.target {
                    Some(target) => write!(f, "{}.{}(", self.child(target), c.method.name)?,
                    None => write!(f, "{}.{}(", c.method.declaring_type, c.method.name)?,
                }
                self.write_list(f, &c.args)?;
                write!(f, ")")
            }
            Expression::Index(i) => {
                write!(f, "{}[", self.child(&i.target))?;
                self.write_list(f, &i.args)?;
                write!(f, "]")
            }
            Expression::New(n) => {
                write!(f, "new {}(", n.ty)?;
                match &n.members {
                    Some(members) => {
                        for (i, (name, arg)) in members.iter().zip(&n.args).enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{} = {}", name, self.child(arg))?;
                        }
                    }
                    None => self.write_list(f, &n.args)?,
                }
                write!(f, ")")
            }
            Expression::ListInit(l) => {
                write!(f, "new [] {{")?;
                self.write_list(f, &l.elements)?;
                write!(f, "}}")
            }
            Expression::Conditional(c) => {
                write!(
                    f,
                    "IIF({}, {}, {})",
                    self.child(&c.test),
                    self.child(&c.if_true),
                    self.child(&c.if_false)
                )
            }
            Expression::QuerySource(q) => write!(f, "value(Queryable<{}>)", q.element_type),
        }
    }
}
