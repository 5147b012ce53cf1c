//! Storage mappings
//!
//! `Mapping<K, V>` takes one key, `MappingNested<K1, K2, V>` two. Both are
//! addressed through their base slot; values are always scalar.

use super::{build_expr, check_value, expect_arity, note_storage_read, note_storage_write};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrExpr, IrExprKind, SemType};
use crate::compiler::symbols::VariableInfo;
use crate::error::{Error, Result};
use crate::parser::Expr;

/// Key types and value type of a mapping variable
fn shape(info: &VariableInfo) -> (Vec<SemType>, SemType) {
    match &info.ty {
        SemType::Mapping { key, value } => (vec![(**key).clone()], (**value).clone()),
        SemType::MappingNested { key1, key2, value } => {
            (vec![(**key1).clone(), (**key2).clone()], (**value).clone())
        }
        other => (Vec::new(), other.clone()),
    }
}

/// Builds and type-checks the keys of one access, left to right
pub fn build_keys(
    info: &VariableInfo,
    exprs: &[&Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<Vec<IrExpr>> {
    let (key_types, _) = shape(info);
    if key_types.len() != exprs.len() {
        return Err(Error::unsupported(
            format!(
                "`{}` takes {} key(s), got {}",
                info.name,
                key_types.len(),
                exprs.len()
            ),
            line,
        ));
    }
    let mut built = Vec::with_capacity(exprs.len());
    for (expr, expected) in exprs.iter().zip(&key_types) {
        let mut key = build_expr(expr, ctx)?;
        check_value(ctx, &info.name, expected, &mut key, line);
        built.push(key);
    }
    Ok(built)
}

/// Read node for already built keys
pub fn read(info: &VariableInfo, mut keys: Vec<IrExpr>, ctx: &mut CompilationContext, line: usize) -> IrExpr {
    note_storage_read(ctx, &info.name, line);
    let value = shape(info).1;
    let name = info.name.clone();
    let slot = info.slot.unwrap_or_default();
    let kind = if keys.len() == 2 {
        let key2 = Box::new(keys.remove(1));
        let key1 = Box::new(keys.remove(0));
        IrExprKind::MapGet2 {
            name,
            slot,
            key1,
            key2,
        }
    } else {
        IrExprKind::MapGet {
            name,
            slot,
            key: Box::new(keys.remove(0)),
        }
    };
    IrExpr::new(kind, value)
}

/// Write node for already built keys
pub fn write(
    info: &VariableInfo,
    mut keys: Vec<IrExpr>,
    mut value: IrExpr,
    ctx: &mut CompilationContext,
    line: usize,
) -> IrExpr {
    let value_ty = shape(info).1;
    check_value(ctx, &info.name, &value_ty, &mut value, line);
    note_storage_write(ctx, &info.name, line);
    let name = info.name.clone();
    let slot = info.slot.unwrap_or_default();
    let kind = if keys.len() == 2 {
        let key2 = Box::new(keys.remove(1));
        let key1 = Box::new(keys.remove(0));
        IrExprKind::MapSet2 {
            name,
            slot,
            key1,
            key2,
            value: Box::new(value),
        }
    } else {
        IrExprKind::MapSet {
            name,
            slot,
            key: Box::new(keys.remove(0)),
            value: Box::new(value),
        }
    };
    IrExpr::new(kind, SemType::Void)
}

/// `this.m[k]` / `this.m.get(k)`
pub fn get(info: &VariableInfo, key: &Expr, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    let keys = build_keys(info, &[key], ctx, line)?;
    Ok(read(info, keys, ctx, line))
}

/// `this.m[a][b]` / `this.m.get(a, b)`
pub fn get2(
    info: &VariableInfo,
    key1: &Expr,
    key2: &Expr,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let keys = build_keys(info, &[key1, key2], ctx, line)?;
    Ok(read(info, keys, ctx, line))
}

/// `this.m.get(..)` / `this.m.set(..)`
pub fn method_call(
    info: &VariableInfo,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let arity = shape(info).0.len();
    match method {
        "get" => {
            expect_arity(method, args, arity, line)?;
            let key_exprs: Vec<&Expr> = args.iter().collect();
            let keys = build_keys(info, &key_exprs, ctx, line)?;
            Ok(read(info, keys, ctx, line))
        }
        "set" => {
            expect_arity(method, args, arity + 1, line)?;
            let key_exprs: Vec<&Expr> = args[..arity].iter().collect();
            let keys = build_keys(info, &key_exprs, ctx, line)?;
            let value = build_expr(&args[arity], ctx)?;
            Ok(write(info, keys, value, ctx, line))
        }
        other => Err(Error::unsupported(
            format!("method `{}` on mapping `{}`", other, info.name),
            line,
        )),
    }
}
