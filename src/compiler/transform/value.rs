//! Globals, address/text values and struct values

use super::literal::string_bytes;
use super::{names, CallTransformer, EmitContext, EmitResult, TransformerRegistry};
use crate::compiler::ir::{IrExpr, IrExprKind, Literal, SemType, VarScope};

/// `Msg.sender`, `Msg.value`, `Block.timestamp`, `Block.number`
pub(super) struct GlobalTransformer;

impl CallTransformer for GlobalTransformer {
    fn name(&self) -> &'static str {
        "globals"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_none()
            && matches!(
                target,
                "Msg.sender" | "Msg.value" | "Block.timestamp" | "Block.number"
            )
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        match call.call_target() {
            Some(target) => EmitResult::value(format!("{}()", target), call.ty.clone()),
            None => registry.fallback(call, "global", ctx),
        }
    }
}

/// `AddressFactory.*` and `StrFactory.*`
pub(super) struct AddressFactoryTransformer;

impl CallTransformer for AddressFactoryTransformer {
    fn name(&self) -> &'static str {
        "address-str-factory"
    }

    fn can_handle(&self, target: &str, _receiver: Option<&IrExpr>) -> bool {
        target.starts_with("AddressFactory.") || target.starts_with("StrFactory.")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call { target, args, .. } = &call.kind else {
            return registry.fallback(call, "non-call factory", ctx);
        };
        let runtime = call.ty.runtime_name();
        let text = match args.as_slice() {
            [IrExpr {
                kind: IrExprKind::Literal(Literal::Str(text)),
                ..
            }] => Some(text),
            _ => None,
        };
        match (target.ends_with(".create"), text) {
            (true, None) => EmitResult::value(format!("{}.create()", runtime), call.ty.clone()),
            (false, Some(text)) => {
                let (setup, ptr, len) = string_bytes(text, ctx);
                let ctor = if call.ty == SemType::Str {
                    "fromBytes"
                } else {
                    "fromString"
                };
                EmitResult::with_setup(
                    setup,
                    format!("{}.{}({}, {})", runtime, ctor, ptr, len),
                    call.ty.clone(),
                )
            }
            _ => registry.fallback(call, &format!("factory call `{}`", target), ctx),
        }
    }
}

/// `Address.isZero`, `Str.length`
pub(super) struct ValueMethodTransformer;

impl CallTransformer for ValueMethodTransformer {
    fn name(&self) -> &'static str {
        "value-methods"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_some() && matches!(target, "Address.isZero" | "Str.length")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call {
            target,
            receiver: Some(receiver),
            ..
        } = &call.kind
        else {
            return registry.fallback(call, "value method without receiver", ctx);
        };
        let inner = registry.expr(receiver, ctx);
        EmitResult::with_setup(
            inner.setup_lines,
            format!("{}({})", target, inner.value_expr),
            call.ty.clone(),
        )
    }
}

/// `StructFactory.create<T>([...])`
pub(super) struct StructFactoryTransformer;

impl CallTransformer for StructFactoryTransformer {
    fn name(&self) -> &'static str {
        "struct-factory"
    }

    fn can_handle(&self, target: &str, _receiver: Option<&IrExpr>) -> bool {
        target == "StructFactory.create"
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let (IrExprKind::Call { args, .. }, SemType::Struct(name)) = (&call.kind, &call.ty) else {
            return registry.fallback(call, "struct factory without struct type", ctx);
        };
        let refs: Vec<&IrExpr> = args.iter().collect();
        let (setup, values) = registry.sequence(&refs, ctx);
        EmitResult::with_setup(
            setup,
            format!("{}({})", names::struct_create(name), values.join(", ")),
            call.ty.clone(),
        )
    }
}

/// Struct field read
///
/// Fields of a storage struct have their own slots and accessors; anything
/// else is a pointer into memory.
pub(super) fn member(
    registry: &TransformerRegistry,
    object: &IrExpr,
    field: &str,
    ty: SemType,
    ctx: &mut EmitContext,
) -> EmitResult {
    if let IrExprKind::Var {
        name,
        scope: VarScope::Storage,
    } = &object.kind
    {
        return EmitResult::value(format!("{}()", names::load_field(name, field)), ty);
    }
    let SemType::Struct(struct_name) = &object.ty else {
        let expr = IrExpr::new(
            IrExprKind::Member {
                object: Box::new(object.clone()),
                field: field.to_string(),
            },
            ty,
        );
        return registry.fallback(&expr, &format!("field `{}` on {}", field, object.ty), ctx);
    };
    let base = registry.expr(object, ctx);
    EmitResult::with_setup(
        base.setup_lines,
        format!("{}({})", names::struct_get(struct_name, field), base.value_expr),
        ty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> SemType {
        SemType::Struct("Position".into())
    }

    #[test]
    fn test_storage_struct_field_uses_field_accessor() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let expr = IrExpr::new(
            IrExprKind::Member {
                object: Box::new(IrExpr::var("pos", VarScope::Storage, position())),
                field: "owner".into(),
            },
            SemType::Address,
        );
        assert_eq!(registry.expr(&expr, &mut ctx).value_expr, "load_pos_owner()");
    }

    #[test]
    fn test_memory_struct_field_uses_getter() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let expr = IrExpr::new(
            IrExprKind::Member {
                object: Box::new(IrExpr::var("p", VarScope::Memory, position())),
                field: "amount".into(),
            },
            SemType::U256,
        );
        assert_eq!(registry.expr(&expr, &mut ctx).value_expr, "Position_get_amount(p)");
    }

    #[test]
    fn test_struct_factory() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let call = IrExpr::call(
            "StructFactory.create",
            None,
            vec![
                IrExpr::call("Msg.sender", None, vec![], SemType::Address),
                IrExpr::int("3", SemType::U256),
            ],
            position(),
        );
        assert_eq!(
            registry.expr(&call, &mut ctx).value_expr,
            "Position_create(Msg.sender(), U256.fromU64(3))"
        );
    }

    #[test]
    fn test_address_from_string() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let text = "0x0000000000000000000000000000000000000001";
        let arg = IrExpr::new(IrExprKind::Literal(Literal::Str(text.into())), SemType::Str);
        let call = IrExpr::call("AddressFactory.fromString", None, vec![arg], SemType::Address);
        let out = registry.expr(&call, &mut ctx);
        assert_eq!(out.setup_lines.len(), text.len() + 1);
        assert_eq!(out.value_expr, format!("Address.fromString(__s0, {})", text.len()));
    }
}
