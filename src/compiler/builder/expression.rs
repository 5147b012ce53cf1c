//! Expression classification
//!
//! Dispatches purely on the syntactic node kind. Kinds outside the supported
//! subset (`new`, ternaries, object literals, assignments used as values) are
//! hard failures.

use super::{
    array, binary, builtins, events, interfaces, mapping, method, note_storage_read, structs,
    wide_int, IrBuilder,
};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrExpr, IrExprKind, IrUnaryOp, Literal, SemType, VarScope};
use crate::compiler::symbols::VariableInfo;
use crate::error::{Error, Result};
use crate::parser::{Expr, ExprKind, UnaryOp};

/// Builds the IR for one expression node
pub struct ExpressionBuilder<'a> {
    expr: &'a Expr,
}

impl<'a> ExpressionBuilder<'a> {
    /// Wraps a syntax node
    pub fn new(expr: &'a Expr) -> Self {
        ExpressionBuilder { expr }
    }
}

impl IrBuilder for ExpressionBuilder<'_> {
    type Output = IrExpr;

    fn validate(&mut self, _ctx: &mut CompilationContext) -> bool {
        // Unsupported kinds are hard failures raised by `build_ir`
        !matches!(
            self.expr.kind,
            ExprKind::New { .. } | ExprKind::Conditional { .. } | ExprKind::Object(_)
        )
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrExpr> {
        let expr = self.expr;
        let line = expr.line;
        match &expr.kind {
            ExprKind::Number(text) => {
                wide_int::check_int_literal(text, false)
                    .map_err(|reason| Error::unsupported(reason, line))?;
                Ok(IrExpr::int(text.clone(), SemType::U256))
            }
            ExprKind::Str(s) => Ok(IrExpr::new(
                IrExprKind::Literal(Literal::Str(s.clone())),
                SemType::Str,
            )),
            ExprKind::Bool(b) => Ok(IrExpr::boolean(*b)),
            ExprKind::Identifier(name) => identifier(name, ctx, line),
            ExprKind::This => Err(Error::unsupported("`this` used as a value", line)),
            ExprKind::Call {
                callee,
                type_args,
                args,
            } => build_call(callee, type_args, args, ctx, line),
            ExprKind::Member { object, property } => member(object, property, ctx, line),
            ExprKind::Index { object, index } => index_read(object, index, ctx, line),
            ExprKind::Binary { op, left, right } => {
                binary::BinaryBuilder::new(*op, left, right, line).validate_and_build_ir(ctx)
            }
            ExprKind::Unary { op, operand } => unary(*op, operand, ctx, line),
            ExprKind::ArrayLiteral(items) => array::array_literal(items, ctx, line),
            ExprKind::Assign { .. } => Err(Error::unsupported("assignment used as a value", line)),
            ExprKind::New { .. } | ExprKind::Conditional { .. } | ExprKind::Object(_) => {
                Err(Error::unsupported(expr.kind_name(), line))
            }
        }
    }
}

/// Builds one expression
pub fn build_expr(expr: &Expr, ctx: &mut CompilationContext) -> Result<IrExpr> {
    ExpressionBuilder::new(expr).validate_and_build_ir(ctx)
}

/// Storage field referenced as `this.name`, without recording a read
pub(crate) fn this_field(expr: &Expr, ctx: &CompilationContext) -> Option<VariableInfo> {
    match &expr.kind {
        ExprKind::Member { object, property } if matches!(object.kind, ExprKind::This) => {
            ctx.symbols.lookup_storage(property).cloned()
        }
        _ => None,
    }
}

fn identifier(name: &str, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    match ctx.symbols.lookup_variable(name) {
        Some(info) if info.scope == VarScope::Memory => {
            Ok(IrExpr::var(name, VarScope::Memory, info.ty.clone()))
        }
        _ => Err(Error::UndefinedSymbol {
            name: name.to_string(),
            line,
        }),
    }
}

fn member(object: &Expr, property: &str, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    if let ExprKind::This = object.kind {
        return match ctx.symbols.lookup_storage(property).cloned() {
            Some(info) => {
                note_storage_read(ctx, property, line);
                Ok(IrExpr::var(property, VarScope::Storage, info.ty))
            }
            None if ctx.symbols.lookup_function(property).is_some() => Err(Error::unsupported(
                format!("method `{}` referenced without a call", property),
                line,
            )),
            None => Err(Error::UndefinedSymbol {
                name: format!("this.{}", property),
                line,
            }),
        };
    }

    if let Some(global) = object.as_identifier() {
        if builtins::is_global(global) && ctx.symbols.lookup_variable(global).is_none() {
            return builtins::global_member(global, property, line);
        }
    }

    let base = build_expr(object, ctx)?;
    match &base.ty {
        SemType::Struct(_) => structs::field_read(base, property, ctx, line),
        SemType::StaticArray { .. } | SemType::DynamicArray(_) if property == "length" => {
            Ok(array::length(base))
        }
        SemType::Str if property == "length" => Ok(IrExpr::call(
            "Str.length",
            Some(base),
            vec![],
            SemType::U256,
        )),
        other => Err(Error::unsupported(
            format!("property `{}` on {}", property, other),
            line,
        )),
    }
}

fn index_read(object: &Expr, index: &Expr, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    // this.nested[a][b]
    if let ExprKind::Index {
        object: inner,
        index: outer_key,
    } = &object.kind
    {
        if let Some(info) = this_field(inner, ctx) {
            if matches!(info.ty, SemType::MappingNested { .. }) {
                return mapping::get2(&info, outer_key, index, ctx, line);
            }
        }
    }

    if let Some(info) = this_field(object, ctx) {
        match info.ty {
            SemType::Mapping { .. } => return mapping::get(&info, index, ctx, line),
            SemType::MappingNested { .. } => {
                return Err(Error::unsupported(
                    format!("`{}` needs two keys", info.name),
                    line,
                ))
            }
            _ => {}
        }
    }

    let base = build_expr(object, ctx)?;
    if base.ty.array_element().is_some() {
        let idx = build_expr(index, ctx)?;
        return array::get(base, idx, ctx, line);
    }
    Err(Error::unsupported(
        format!("indexing a value of type {}", base.ty),
        line,
    ))
}

fn unary(op: UnaryOp, operand: &Expr, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    match op {
        UnaryOp::Not => {
            let inner = build_expr(operand, ctx)?;
            if inner.ty != SemType::Bool {
                return Err(Error::unsupported(
                    format!("`!` applied to {}", inner.ty),
                    line,
                ));
            }
            Ok(IrExpr::new(
                IrExprKind::Unary {
                    op: IrUnaryOp::Not,
                    operand: Box::new(inner),
                },
                SemType::Bool,
            ))
        }
        UnaryOp::Neg => {
            if let ExprKind::Number(text) = &operand.kind {
                let negated = format!("-{}", text);
                wide_int::check_int_literal(&negated, true)
                    .map_err(|reason| Error::unsupported(reason, line))?;
                return Ok(IrExpr::int(negated, SemType::I256));
            }
            let inner = build_expr(operand, ctx)?;
            match inner.ty {
                SemType::I256 => Ok(IrExpr::call("I256.negate", Some(inner), vec![], SemType::I256)),
                ref other => Err(Error::unsupported(
                    format!("unary `-` applied to {}", other),
                    line,
                )),
            }
        }
    }
}

/// Routes a call on its callee shape, then on the receiver type
fn build_call(
    callee: &Expr,
    type_args: &[crate::parser::TypeRef],
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let (object, property) = match &callee.kind {
        ExprKind::Member { object, property } => (object.as_ref(), property.as_str()),
        ExprKind::Identifier(name) => {
            return Err(Error::unsupported(
                format!("free function call `{}()`", name),
                line,
            ))
        }
        _ => return Err(Error::unsupported(format!("call of {}", callee.kind_name()), line)),
    };

    if let ExprKind::This = object.kind {
        if ctx.symbols.lookup_storage(property).is_none() {
            return method::internal_call(property, args, ctx, line);
        }
    }

    // Static receivers: factories, declarations and globals
    if let Some(name) = object.as_identifier() {
        if ctx.symbols.lookup_variable(name).is_none() {
            match name {
                "U256Factory" | "I256Factory" => {
                    return wide_int::factory_call(name, property, args, line)
                }
                "AddressFactory" | "StrFactory" => {
                    return builtins::factory_call(name, property, args, line)
                }
                "StructFactory" => return structs::factory_call(property, type_args, args, ctx, line),
                "ErrorFactory" => {
                    return Err(Error::unsupported(
                        "ErrorFactory outside a top-level const",
                        line,
                    ))
                }
                _ => {}
            }
            if ctx.event(name).is_some() {
                return events::emit_call(name, property, args, ctx, line);
            }
            if ctx.error_decl(name).is_some() {
                return Err(Error::unsupported(
                    format!("`{}.{}` is only valid as a statement", name, property),
                    line,
                ));
            }
            if ctx.interface(name).is_some() {
                return interfaces::cast(name, property, args, ctx, line);
            }
        }
    }

    // Storage collections dispatch on the declared field
    if let Some(info) = this_field(object, ctx) {
        match info.ty {
            SemType::Mapping { .. } | SemType::MappingNested { .. } => {
                return mapping::method_call(&info, property, args, ctx, line)
            }
            SemType::StaticArray { .. } | SemType::DynamicArray(_) => {
                return array::storage_method_call(&info, property, args, ctx, line)
            }
            _ => {}
        }
    }

    let receiver = build_expr(object, ctx)?;
    match receiver.ty.clone() {
        SemType::U256 | SemType::I256 => wide_int::method_call(receiver, property, args, ctx, line),
        SemType::Address => builtins::address_method(receiver, property, args, ctx, line),
        SemType::Str => builtins::str_method(receiver, property, args, ctx, line),
        SemType::StaticArray { .. } | SemType::DynamicArray(_) => {
            array::memory_method_call(receiver, property, args, ctx, line)
        }
        SemType::Interface(name) => interfaces::call(&name, receiver, property, args, ctx, line),
        other => Err(Error::unsupported(
            format!("method `{}` on {}", property, other),
            line,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::symbols::VariableInfo;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn parse(source: &str) -> Expr {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    fn ctx() -> CompilationContext {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        ctx.symbols
            .declare_variable("count", VariableInfo::storage("count", SemType::U256));
        ctx.symbols.enter_scope();
        ctx.symbols
            .declare_variable("amount", VariableInfo::local("amount", SemType::U256, true));
        ctx
    }

    #[test]
    fn test_storage_member_is_storage_scoped() {
        let mut c = ctx();
        let ir = build_expr(&parse("this.count"), &mut c).unwrap();
        assert_eq!(ir, IrExpr::var("count", VarScope::Storage, SemType::U256));
    }

    #[test]
    fn test_unknown_identifier_is_hard_error() {
        let mut c = ctx();
        let err = build_expr(&parse("missing"), &mut c).unwrap_err();
        assert!(matches!(err, Error::UndefinedSymbol { .. }));
    }

    #[test]
    fn test_ternary_is_unsupported() {
        let mut c = ctx();
        let err = build_expr(&parse("true ? amount : amount"), &mut c).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_negative_literal_is_signed() {
        let mut c = ctx();
        let ir = build_expr(&parse("-5"), &mut c).unwrap();
        assert_eq!(ir, IrExpr::int("-5", SemType::I256));
    }

    #[test]
    fn test_msg_sender() {
        let mut c = ctx();
        let ir = build_expr(&parse("msg.sender"), &mut c).unwrap();
        assert_eq!(ir.ty, SemType::Address);
        assert_eq!(ir.call_target(), Some("Msg.sender"));
    }
}
