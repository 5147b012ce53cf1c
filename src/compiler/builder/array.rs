//! Array literals and array operations

use super::{
    build_args, build_expr, check_value, expect_arity, note_storage_read, note_storage_write,
};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrExpr, IrExprKind, SemType, VarScope};
use crate::compiler::symbols::VariableInfo;
use crate::error::{Error, Result};
use crate::parser::Expr;

/// `[a, b, c]`; every element must share the first element's type
pub fn array_literal(items: &[Expr], ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    let built = build_args(items, ctx)?;
    let element = match built.first() {
        Some(first) => first.ty.clone(),
        None => return Err(Error::unsupported("empty array literal", line)),
    };
    if let Some(odd) = built.iter().find(|e| e.ty != element) {
        return Err(Error::unsupported(
            format!("array literal mixing {} and {}", element, odd.ty),
            line,
        ));
    }
    let length = built.len() as u64;
    Ok(IrExpr::new(
        IrExprKind::ArrayLiteral(built),
        SemType::StaticArray {
            element: Box::new(element),
            length,
        },
    ))
}

/// `arr.length`
pub fn length(array: IrExpr) -> IrExpr {
    IrExpr::call("Array.length", Some(array), vec![], SemType::U256)
}

fn element_type(array: &IrExpr, line: usize) -> Result<SemType> {
    array
        .ty
        .array_element()
        .cloned()
        .ok_or_else(|| Error::unsupported(format!("indexing a value of type {}", array.ty), line))
}

/// `arr[i]` / `arr.get(i)`
pub fn get(array: IrExpr, index: IrExpr, _ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    let element = element_type(&array, line)?;
    if index.ty != SemType::U256 {
        return Err(Error::unsupported(
            format!("array index of type {}", index.ty),
            line,
        ));
    }
    Ok(IrExpr::call("Array.get", Some(array), vec![index], element))
}

/// `arr[i] = v` / `arr.set(i, v)`
pub fn assign(
    array: IrExpr,
    index: IrExpr,
    mut value: IrExpr,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let element = element_type(&array, line)?;
    if index.ty != SemType::U256 {
        return Err(Error::unsupported(
            format!("array index of type {}", index.ty),
            line,
        ));
    }
    let label = array_label(&array);
    check_value(ctx, &label, &element, &mut value, line);
    if array.scope() == VarScope::Storage {
        note_storage_write(ctx, &label, line);
    }
    Ok(IrExpr::new(
        IrExprKind::ArrayAssignment {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
        },
        SemType::Void,
    ))
}

fn array_label(array: &IrExpr) -> String {
    match &array.kind {
        IrExprKind::Var { name, .. } => name.clone(),
        _ => "array".to_string(),
    }
}

fn push(array: IrExpr, mut value: IrExpr, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    let element = match &array.ty {
        SemType::DynamicArray(element) => (**element).clone(),
        other => {
            return Err(Error::unsupported(
                format!("`push` on fixed-length {}", other),
                line,
            ))
        }
    };
    let label = array_label(&array);
    check_value(ctx, &label, &element, &mut value, line);
    if array.scope() == VarScope::Storage {
        note_storage_write(ctx, &label, line);
    }
    Ok(IrExpr::call("Array.push", Some(array), vec![value], SemType::Void))
}

/// Methods on an in-memory array value
pub fn memory_method_call(
    array: IrExpr,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    match method {
        "get" => {
            expect_arity(method, args, 1, line)?;
            let index = build_expr(&args[0], ctx)?;
            get(array, index, ctx, line)
        }
        "set" => {
            expect_arity(method, args, 2, line)?;
            let mut built = build_args(args, ctx)?;
            let value = built.remove(1);
            assign(array, built.remove(0), value, ctx, line)
        }
        "push" => {
            expect_arity(method, args, 1, line)?;
            let value = build_expr(&args[0], ctx)?;
            push(array, value, ctx, line)
        }
        "length" => {
            expect_arity(method, args, 0, line)?;
            Ok(length(array))
        }
        other => Err(Error::unsupported(
            format!("method `{}` on {}", other, array.ty),
            line,
        )),
    }
}

/// Methods on a storage array field
pub fn storage_method_call(
    info: &VariableInfo,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    if matches!(method, "get" | "length") {
        note_storage_read(ctx, &info.name, line);
    }
    let array = IrExpr::var(info.name.clone(), VarScope::Storage, info.ty.clone());
    memory_method_call(array, method, args, ctx, line)
}
