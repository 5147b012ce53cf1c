//! Event emission, internal calls and cross-contract calls

use super::{names, CallTransformer, EmitContext, EmitResult, TransformerRegistry};
use crate::compiler::ir::{IrExpr, IrExprKind, SemType};

/// Lowers `prefix(receiver?, args...)` via [`TransformerRegistry::sequence`]
fn call_with(
    registry: &TransformerRegistry,
    function: String,
    receiver: Option<&IrExpr>,
    args: &[IrExpr],
    ty: SemType,
    ctx: &mut EmitContext,
) -> EmitResult {
    let mut operands: Vec<&IrExpr> = receiver.into_iter().collect();
    operands.extend(args.iter());
    let (setup, values) = registry.sequence(&operands, ctx);
    EmitResult::with_setup(setup, format!("{}({})", function, values.join(", ")), ty)
}

/// `Transfer.emit(...)`
pub(super) struct EventTransformer;

impl CallTransformer for EventTransformer {
    fn name(&self) -> &'static str {
        "events"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_none() && target.ends_with(".emit")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call { target, args, .. } = &call.kind else {
            return registry.fallback(call, "event", ctx);
        };
        let event = target.trim_end_matches(".emit");
        call_with(registry, names::emit_event(event), None, args, SemType::Void, ctx)
    }
}

/// `this.helper(...)`
pub(super) struct InternalCallTransformer;

impl CallTransformer for InternalCallTransformer {
    fn name(&self) -> &'static str {
        "internal-calls"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_none() && target.starts_with("this.")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call { target, args, .. } = &call.kind else {
            return registry.fallback(call, "internal call", ctx);
        };
        let method = target.trim_start_matches("this.").to_string();
        call_with(registry, method, None, args, call.ty.clone(), ctx)
    }
}

/// `token.balanceOf(owner)` where `token` is interface-typed
pub(super) struct InterfaceCallTransformer;

impl CallTransformer for InterfaceCallTransformer {
    fn name(&self) -> &'static str {
        "interface-calls"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        match receiver.map(|r| &r.ty) {
            Some(SemType::Interface(name)) => target
                .strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
            _ => false,
        }
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call {
            target,
            args,
            receiver: Some(receiver),
            ..
        } = &call.kind
        else {
            return registry.fallback(call, "interface call without receiver", ctx);
        };
        let Some((interface, method)) = target.split_once('.') else {
            return registry.fallback(call, "interface call target", ctx);
        };
        call_with(
            registry,
            names::interface_call(interface, method),
            Some(receiver),
            args,
            call.ty.clone(),
            ctx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::VarScope;

    #[test]
    fn test_event_emit() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let call = IrExpr::call(
            "Transfer.emit",
            None,
            vec![
                IrExpr::call("Msg.sender", None, vec![], SemType::Address),
                IrExpr::var("to", VarScope::Memory, SemType::Address),
                IrExpr::var("amount", VarScope::Memory, SemType::U256),
            ],
            SemType::Void,
        );
        assert_eq!(
            registry.expr(&call, &mut ctx).value_expr,
            "__emit_Transfer(Msg.sender(), to, amount)"
        );
    }

    #[test]
    fn test_interface_call_passes_address_first() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let token = IrExpr::new(
            IrExprKind::InterfaceCast {
                interface: "IToken".into(),
                address: Box::new(IrExpr::var("addr", VarScope::Memory, SemType::Address)),
            },
            SemType::Interface("IToken".into()),
        );
        let call = IrExpr::call(
            "IToken.balanceOf",
            Some(token),
            vec![IrExpr::var("owner", VarScope::Memory, SemType::Address)],
            SemType::U256,
        );
        assert_eq!(
            registry.expr(&call, &mut ctx).value_expr,
            "__call_IToken_balanceOf(addr, owner)"
        );
    }

    #[test]
    fn test_internal_call() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let call = IrExpr::call("this.fee", None, vec![], SemType::U256);
        assert_eq!(registry.expr(&call, &mut ctx).value_expr, "fee()");
    }
}
