//! Comparisons and branch conditions

use super::{build_expr, check_assignable, coerce_literal};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::SemanticCode;
use crate::compiler::ir::{CmpOp, IrExpr, IrExprKind, SemType};
use crate::error::{Error, Result};
use crate::parser::Expr;

/// Builds a comparison node; relational operators need wide integers,
/// equality works on every scalar
pub fn comparison(
    op: CmpOp,
    mut left: IrExpr,
    mut right: IrExpr,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    coerce_literal(&mut right, &left.ty);
    coerce_literal(&mut left, &right.ty);
    let relational = !matches!(op, CmpOp::Eq | CmpOp::NotEq);
    if relational && !left.ty.is_wide_int() {
        return Err(Error::unsupported(
            format!("`{}` on {}", op.symbol(), left.ty),
            line,
        ));
    }
    if !relational && !left.ty.is_scalar() && !matches!(left.ty, SemType::Interface(_)) {
        return Err(Error::unsupported(
            format!("`{}` on {}", op.symbol(), left.ty),
            line,
        ));
    }
    check_assignable(ctx, op.symbol(), &left.ty, &right.ty, line);
    Ok(IrExpr::new(
        IrExprKind::Condition {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        SemType::Bool,
    ))
}

/// Builds a branch or loop condition, recording E013 unless it is boolean
pub fn build_condition(expr: &Expr, ctx: &mut CompilationContext) -> Result<IrExpr> {
    let built = build_expr(expr, ctx)?;
    if built.ty != SemType::Bool {
        ctx.semantic_error(
            SemanticCode::NonBooleanCondition,
            expr.line,
            &[built.ty.to_string()],
        );
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::VarScope;
    use crate::parser::ExprKind;

    #[test]
    fn test_comparison_keeps_receiver_scope() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let left = IrExpr::var("count", VarScope::Storage, SemType::U256);
        let right = IrExpr::int("10", SemType::U256);
        let cond = comparison(CmpOp::Lt, left, right, &mut ctx, 1).unwrap();
        assert_eq!(cond.ty, SemType::Bool);
        assert_eq!(cond.scope(), VarScope::Storage);
    }

    #[test]
    fn test_zero_compares_with_signed_value() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let left = IrExpr::var("v", VarScope::Storage, SemType::I256);
        let cond = comparison(CmpOp::Lt, left, IrExpr::int("0", SemType::U256), &mut ctx, 1).unwrap();
        assert!(ctx.diagnostics.is_empty());
        match cond.kind {
            IrExprKind::Condition { right, .. } => assert_eq!(right.ty, SemType::I256),
            other => panic!("expected condition, got {:?}", other),
        }
    }

    #[test]
    fn test_relational_on_address_rejected() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let a = IrExpr::var("a", VarScope::Memory, SemType::Address);
        let b = IrExpr::var("b", VarScope::Memory, SemType::Address);
        assert!(comparison(CmpOp::Gt, a, b, &mut ctx, 1).is_err());
    }

    #[test]
    fn test_numeric_condition_reports_e013() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let expr = Expr::new(ExprKind::Number("1".into()), 4);
        build_condition(&expr, &mut ctx).unwrap();
        let errs = ctx.diagnostics.semantic_errors();
        assert_eq!(errs[0].code, "E013");
        assert_eq!(errs[0].line, 4);
    }
}
