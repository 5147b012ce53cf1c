//! Wide-integer factories, arithmetic and comparisons

use super::literal::string_bytes;
use super::{CallTransformer, EmitContext, EmitResult, TransformerRegistry};
use crate::compiler::ir::{CmpOp, IrExpr, IrExprKind, Literal, SemType};

/// Runtime function implementing `op` for signed or unsigned operands
pub fn comparison_handler(op: CmpOp, signed: bool) -> String {
    let prefix = if signed { "I256" } else { "U256" };
    format!("{}.{}", prefix, op.handler_name())
}

/// `U256Factory.*` / `I256Factory.*`
pub(super) struct FactoryTransformer;

impl CallTransformer for FactoryTransformer {
    fn name(&self) -> &'static str {
        "wide-int-factory"
    }

    fn can_handle(&self, target: &str, _receiver: Option<&IrExpr>) -> bool {
        target.starts_with("U256Factory.") || target.starts_with("I256Factory.")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call { target, args, .. } = &call.kind else {
            return registry.fallback(call, "non-call factory", ctx);
        };
        let runtime = call.ty.runtime_name();
        match (target.rsplit('.').next(), args.as_slice()) {
            (Some("create"), []) => EmitResult::value(format!("{}.create()", runtime), call.ty.clone()),
            (Some("fromString"), [arg]) => match &arg.kind {
                IrExprKind::Literal(Literal::Str(text)) => {
                    let (setup, ptr, len) = string_bytes(text, ctx);
                    EmitResult::with_setup(
                        setup,
                        format!("{}.fromString({}, {})", runtime, ptr, len),
                        call.ty.clone(),
                    )
                }
                _ => {
                    let text = registry.expr(arg, ctx);
                    EmitResult::with_setup(
                        text.setup_lines,
                        format!("{}.fromStr({})", runtime, text.value_expr),
                        call.ty.clone(),
                    )
                }
            },
            _ => registry.fallback(call, &format!("factory call `{}`", target), ctx),
        }
    }
}

/// `U256.add`, `I256.subUnchecked`, `U256.toString`, ...
///
/// Checked and wrapping variants share this handler; the runtime function
/// name carries the `Unchecked` suffix.
pub(super) struct ArithmeticTransformer;

impl CallTransformer for ArithmeticTransformer {
    fn name(&self) -> &'static str {
        "wide-int-arithmetic"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_some() && (target.starts_with("U256.") || target.starts_with("I256."))
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call {
            target,
            args,
            receiver: Some(receiver),
            ..
        } = &call.kind
        else {
            return registry.fallback(call, "wide-int method without receiver", ctx);
        };
        let mut operands: Vec<&IrExpr> = vec![receiver];
        operands.extend(args.iter());
        let (setup, values) = registry.sequence(&operands, ctx);
        EmitResult::with_setup(
            setup,
            format!("{}({})", target, values.join(", ")),
            call.ty.clone(),
        )
    }
}

/// Lowers an IR condition
pub(super) fn comparison(
    registry: &TransformerRegistry,
    op: CmpOp,
    left: &IrExpr,
    right: &IrExpr,
    ctx: &mut EmitContext,
) -> EmitResult {
    let (setup, values) = registry.sequence(&[left, right], ctx);
    let (a, b) = (&values[0], &values[1]);
    let value = match &left.ty {
        ty if ty.is_wide_int() => format!("{}({}, {})", comparison_handler(op, ty.is_signed()), a, b),
        SemType::Bool => format!("({} {} {})", a, op.symbol(), b),
        other => {
            let runtime = match other {
                SemType::Str => "Str",
                _ => "Address",
            };
            let equals = format!("{}.equals({}, {})", runtime, a, b);
            match op {
                CmpOp::NotEq => format!("!{}", equals),
                _ => equals,
            }
        }
    };
    EmitResult::with_setup(setup, value, SemType::Bool)
}
