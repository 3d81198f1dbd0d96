//! Query tree printer
//!
//! Serializes a representable query tree to the canonical filter text.
//! Parentheses are emitted only where operator precedence requires them.

use crate::literal::format_literal;
use crate::query::{ArithmeticOp, LogicalOp, QueryKind, QueryNode};
use crate::tracker::ensure_representable;
use crate::{CompileError, CompileResult};

/// Binding strength, lowest first
mod precedence {
    pub const NONE: u8 = 0;
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const COMPARISON: u8 = 4;
    pub const ADDITIVE: u8 = 5;
    pub const MULTIPLICATIVE: u8 = 6;
    pub const UNARY: u8 = 7;
    pub const PRIMARY: u8 = 8;
}

fn precedence_of(node: &QueryNode) -> u8 {
    match node.kind() {
        QueryKind::Logical { op: LogicalOp::Or, .. } => precedence::OR,
        QueryKind::Logical { op: LogicalOp::And, .. } => precedence::AND,
        QueryKind::Comparison { .. } => precedence::COMPARISON,
        QueryKind::Arithmetic {
            op: ArithmeticOp::Add | ArithmeticOp::Subtract,
            ..
        } => precedence::ADDITIVE,
        QueryKind::Arithmetic { .. } => precedence::MULTIPLICATIVE,
        QueryKind::Not(_) | QueryKind::Negate(_) => precedence::UNARY,
        QueryKind::Projection(_) | QueryKind::Selector(_) => precedence::NONE,
        _ => precedence::PRIMARY,
    }
}

/// Print a query tree.
///
/// Fails with the tracked unsupported-construct error when the tree
/// contains any unsupported marker; nothing partial is ever returned.
pub fn print(node: &QueryNode) -> CompileResult<String> {
    ensure_representable(node)?;
    let mut out = String::new();
    Printer { out: &mut out }.write(node, precedence::NONE)?;
    log::trace!("printed query `{}`", out);
    Ok(out)
}

struct Printer<'a> {
    out: &'a mut String,
}

impl Printer<'_> {
    /// Write `node`, parenthesized when it binds looser than `min`
    fn write(&mut self, node: &QueryNode, min: u8) -> CompileResult<()> {
        let parenthesize = precedence_of(node) < min;
        if parenthesize {
            self.out.push('(');
        }
        self.write_bare(node)?;
        if parenthesize {
            self.out.push(')');
        }
        Ok(())
    }

    fn write_binary(&mut self, left: &QueryNode, token: &str, right: &QueryNode, left_min: u8, right_min: u8) -> CompileResult<()> {
        self.write(left, left_min)?;
        self.out.push(' ');
        self.out.push_str(token);
        self.out.push(' ');
        self.write(right, right_min)
    }

    fn write_list<'n>(&mut self, items: impl IntoIterator<Item = &'n QueryNode>) -> CompileResult<()> {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.write(item, precedence::NONE)?;
        }
        Ok(())
    }

    fn write_bare(&mut self, node: &QueryNode) -> CompileResult<()> {
        match node.kind() {
            QueryKind::Constant(value) => {
                let literal = format_literal(value).map_err(|err| CompileError::UnsupportedConstruct {
                    expression: value.to_string(),
                    cause: Some(err.into()),
                })?;
                self.out.push_str(&literal);
            }
            QueryKind::Member(path) => self.out.push_str(&path.to_string()),
            QueryKind::Comparison { op, left, right } => {
                // Comparisons do not chain
                let min = precedence::COMPARISON + 1;
                self.write_binary(left, op.token(), right, min, min)?;
            }
            QueryKind::Logical { op, left, right } => {
                let own = precedence_of(node);
                self.write_binary(left, op.token(), right, own, own)?;
            }
            QueryKind::Arithmetic { op, left, right } => {
                let own = precedence_of(node);
                self.write_binary(left, op.token(), right, own, own + 1)?;
            }
            QueryKind::Not(operand) => {
                self.out.push_str("not ");
                self.write(operand, precedence::UNARY)?;
            }
            QueryKind::Negate(operand) => {
                self.out.push('-');
                self.write(operand, precedence::UNARY)?;
            }
            QueryKind::Call { function, args } => {
                self.out.push_str(function.name());
                self.out.push('(');
                self.write_list(args)?;
                self.out.push(')');
            }
            QueryKind::Projection(fields) => {
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.write(value, precedence::COMPARISON)?;
                    self.out.push_str(" as ");
                    self.out.push_str(name);
                }
            }
            QueryKind::List(elements) => {
                self.out.push('[');
                self.write_list(elements)?;
                self.out.push(']');
            }
            QueryKind::Selector(value) => {
                self.write(value, precedence::COMPARISON)?;
                self.out.push_str(" as this");
            }
            QueryKind::QuerySource => self.out.push_str("this"),
            QueryKind::SelectMany { selector, .. } => self.write(selector, precedence::NONE)?,
            QueryKind::Unsupported(marker) => return Err(crate::tracker::to_error(marker)),
        }
        Ok(())
    }
}
