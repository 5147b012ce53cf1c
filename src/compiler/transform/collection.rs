//! Mappings and arrays

use super::{
    names, storage_value, type_name, CallTransformer, EmitContext, EmitResult, TransformerRegistry,
};
use crate::compiler::ir::{IrExpr, IrExprKind, SemType, VarScope};

/// Name of a storage variable, when `expr` is one
fn storage_name(expr: &IrExpr) -> Option<&str> {
    match &expr.kind {
        IrExprKind::Var {
            name,
            scope: VarScope::Storage,
        } => Some(name),
        _ => None,
    }
}

pub(super) fn map_get(
    registry: &TransformerRegistry,
    name: &str,
    keys: &[&IrExpr],
    ty: SemType,
    ctx: &mut EmitContext,
) -> EmitResult {
    let (setup, values) = registry.sequence(keys, ctx);
    EmitResult::with_setup(setup, format!("{}({})", names::load(name), values.join(", ")), ty)
}

pub(super) fn map_set(
    registry: &TransformerRegistry,
    name: &str,
    keys: &[&IrExpr],
    value: &IrExpr,
    ctx: &mut EmitContext,
) -> EmitResult {
    let mut operands = keys.to_vec();
    operands.push(value);
    let (setup, mut values) = registry.sequence(&operands, ctx);
    if let Some(last) = values.last_mut() {
        *last = storage_value(last, &value.ty);
    }
    EmitResult::with_setup(
        setup,
        format!("{}({})", names::store(name), values.join(", ")),
        SemType::Void,
    )
}

pub(super) fn array_literal(
    registry: &TransformerRegistry,
    items: &[IrExpr],
    ty: SemType,
    ctx: &mut EmitContext,
) -> EmitResult {
    let element = ty.array_element().cloned().unwrap_or(SemType::U256);
    let refs: Vec<&IrExpr> = items.iter().collect();
    let (mut setup, values) = registry.sequence(&refs, ctx);
    let temp = ctx.temp("a");
    setup.push(format!(
        "const {} = new Array<{}>({});",
        temp,
        type_name(&element),
        values.len()
    ));
    for (i, value) in values.iter().enumerate() {
        setup.push(format!("{}[{}] = {};", temp, i, value));
    }
    EmitResult::with_setup(setup, temp, ty)
}

pub(super) fn array_assign(
    registry: &TransformerRegistry,
    array: &IrExpr,
    index: &IrExpr,
    value: &IrExpr,
    ctx: &mut EmitContext,
) -> EmitResult {
    if let Some(name) = storage_name(array) {
        let (setup, values) = registry.sequence(&[index, value], ctx);
        return EmitResult::with_setup(
            setup,
            format!(
                "{}({}, {})",
                names::store(name),
                values[0],
                storage_value(&values[1], &value.ty)
            ),
            SemType::Void,
        );
    }
    let (setup, values) = registry.sequence(&[array, index, value], ctx);
    EmitResult::with_setup(
        setup,
        format!("{}[U256.toU32({})] = {}", values[0], values[1], values[2]),
        SemType::Void,
    )
}

/// `Array.length`, `Array.get`, `Array.push`
pub(super) struct ArrayTransformer;

impl CallTransformer for ArrayTransformer {
    fn name(&self) -> &'static str {
        "arrays"
    }

    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool {
        receiver.is_some() && matches!(target, "Array.length" | "Array.get" | "Array.push")
    }

    fn handle(&self, registry: &TransformerRegistry, call: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let IrExprKind::Call {
            target,
            args,
            receiver: Some(array),
            ..
        } = &call.kind
        else {
            return registry.fallback(call, "array method without receiver", ctx);
        };
        let ty = call.ty.clone();

        if let Some(name) = storage_name(array) {
            let refs: Vec<&IrExpr> = args.iter().collect();
            let (setup, mut values) = registry.sequence(&refs, ctx);
            let value = match target.as_str() {
                "Array.length" => format!("{}()", names::length(name)),
                "Array.get" => format!("{}({})", names::load(name), values.join(", ")),
                _ => {
                    if let (Some(last), Some(arg)) = (values.last_mut(), args.last()) {
                        *last = storage_value(last, &arg.ty);
                    }
                    format!("{}({})", names::push(name), values.join(", "))
                }
            };
            return EmitResult::with_setup(setup, value, ty);
        }

        let mut operands: Vec<&IrExpr> = vec![array];
        operands.extend(args.iter());
        let (setup, values) = registry.sequence(&operands, ctx);
        let value = match (target.as_str(), values.as_slice()) {
            ("Array.length", [a]) => format!("U256.fromU64(<u64>{}.length)", a),
            ("Array.get", [a, i]) => format!("{}[U256.toU32({})]", a, i),
            ("Array.push", [a, v]) => format!("{}.push({})", a, v),
            _ => return registry.fallback(call, &format!("`{}` arity", target), ctx),
        };
        EmitResult::with_setup(setup, value, ty)
    }
}
