//! Binary operators
//!
//! `&&`/`||` stay logical nodes, comparisons become `condition` nodes and
//! arithmetic on wide integers lowers to the same checked calls the
//! method form (`a.add(b)`) produces.

use super::{build_expr, coerce_literal, condition, IrBuilder};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{CmpOp, IrExpr, IrExprKind, LogicOp, SemType};
use crate::error::{Error, Result};
use crate::parser::{BinaryOp, Expr};

/// Builds `left op right`
pub struct BinaryBuilder<'a> {
    op: BinaryOp,
    left: &'a Expr,
    right: &'a Expr,
    line: usize,
}

impl<'a> BinaryBuilder<'a> {
    /// Wraps the operands of one binary node
    pub fn new(op: BinaryOp, left: &'a Expr, right: &'a Expr, line: usize) -> Self {
        BinaryBuilder {
            op,
            left,
            right,
            line,
        }
    }
}

fn cmp_op(op: BinaryOp) -> Option<CmpOp> {
    match op {
        BinaryOp::Lt => Some(CmpOp::Lt),
        BinaryOp::Gt => Some(CmpOp::Gt),
        BinaryOp::LtEq => Some(CmpOp::LtEq),
        BinaryOp::GtEq => Some(CmpOp::GtEq),
        BinaryOp::Eq => Some(CmpOp::Eq),
        BinaryOp::NotEq => Some(CmpOp::NotEq),
        _ => None,
    }
}

/// Runtime method for an arithmetic operator
pub fn arithmetic_method(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::Add => Some("add"),
        BinaryOp::Sub => Some("sub"),
        BinaryOp::Mul => Some("mul"),
        BinaryOp::Div => Some("div"),
        BinaryOp::Mod => Some("mod"),
        _ => None,
    }
}

/// Combines two built operands
pub fn combine(
    op: BinaryOp,
    left: IrExpr,
    right: IrExpr,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    if let Some(cmp) = cmp_op(op) {
        return condition::comparison(cmp, left, right, ctx, line);
    }

    if let Some(method) = arithmetic_method(op) {
        let (mut left, mut right) = (left, right);
        coerce_literal(&mut right, &left.ty);
        coerce_literal(&mut left, &right.ty);
        if !left.ty.is_wide_int() || left.ty != right.ty {
            return Err(Error::unsupported(
                format!("`{}` between {} and {}", op.symbol(), left.ty, right.ty),
                line,
            ));
        }
        let prefix = if left.ty.is_signed() { "I256" } else { "U256" };
        let ty = left.ty.clone();
        return Ok(IrExpr::call(
            format!("{}.{}", prefix, method),
            Some(left),
            vec![right],
            ty,
        ));
    }

    let logic = match op {
        BinaryOp::And => LogicOp::And,
        _ => LogicOp::Or,
    };
    if left.ty != SemType::Bool || right.ty != SemType::Bool {
        return Err(Error::unsupported(
            format!("`{}` between {} and {}", op.symbol(), left.ty, right.ty),
            line,
        ));
    }
    Ok(IrExpr::new(
        IrExprKind::Binary {
            op: logic,
            left: Box::new(left),
            right: Box::new(right),
        },
        SemType::Bool,
    ))
}

impl IrBuilder for BinaryBuilder<'_> {
    type Output = IrExpr;

    fn validate(&mut self, _ctx: &mut CompilationContext) -> bool {
        true
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrExpr> {
        let left = build_expr(self.left, ctx)?;
        let right = build_expr(self.right, ctx)?;
        combine(self.op, left, right, ctx, self.line)
    }
}
