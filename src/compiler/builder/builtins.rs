//! Address and text factories, `msg`/`block` globals and their methods

use lazy_static::lazy_static;
use regex::Regex;

use super::{build_args, condition, expect_arity};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{CmpOp, IrExpr, IrExprKind, Literal, SemType};
use crate::error::{Error, Result};
use crate::parser::{Expr, ExprKind};

lazy_static! {
    static ref ADDRESS: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
}

/// Whether `name` is an ambient global object
pub fn is_global(name: &str) -> bool {
    matches!(name, "msg" | "block")
}

/// `msg.sender`, `msg.value`, `block.timestamp`, `block.number`
pub fn global_member(global: &str, property: &str, line: usize) -> Result<IrExpr> {
    let (target, ty) = match (global, property) {
        ("msg", "sender") => ("Msg.sender", SemType::Address),
        ("msg", "value") => ("Msg.value", SemType::U256),
        ("block", "timestamp") => ("Block.timestamp", SemType::U256),
        ("block", "number") => ("Block.number", SemType::U256),
        _ => {
            return Err(Error::UndefinedSymbol {
                name: format!("{}.{}", global, property),
                line,
            })
        }
    };
    Ok(IrExpr::call(target, None, vec![], ty))
}

fn string_literal_arg<'a>(factory: &str, args: &'a [Expr], line: usize) -> Result<&'a str> {
    match args {
        [Expr {
            kind: ExprKind::Str(s),
            ..
        }] => Ok(s),
        _ => Err(Error::malformed_factory(
            factory,
            "`fromString` expects one string literal",
            line,
        )),
    }
}

/// `AddressFactory.*` and `StrFactory.*`
pub fn factory_call(factory: &str, method: &str, args: &[Expr], line: usize) -> Result<IrExpr> {
    let ty = if factory == "AddressFactory" {
        SemType::Address
    } else {
        SemType::Str
    };
    match method {
        "create" if args.is_empty() => {
            Ok(IrExpr::call(format!("{}.create", factory), None, vec![], ty))
        }
        "create" => Err(Error::malformed_factory(
            factory,
            "`create` takes no arguments",
            line,
        )),
        "fromString" => {
            let text = string_literal_arg(factory, args, line)?;
            if ty == SemType::Address && !ADDRESS.is_match(text) {
                return Err(Error::malformed_factory(
                    factory,
                    format!("`{}` is not a 20-byte hex address", text),
                    line,
                ));
            }
            let arg = IrExpr::new(
                IrExprKind::Literal(Literal::Str(text.to_string())),
                SemType::Str,
            );
            Ok(IrExpr::call(
                format!("{}.fromString", factory),
                None,
                vec![arg],
                ty,
            ))
        }
        other => Err(Error::malformed_factory(
            factory,
            format!("unknown factory method `{}`", other),
            line,
        )),
    }
}

/// Methods on an `Address` receiver
pub fn address_method(
    receiver: IrExpr,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    match method {
        "equals" | "notEqual" => {
            expect_arity(method, args, 1, line)?;
            let mut built = build_args(args, ctx)?;
            let op = CmpOp::from_method(method).unwrap_or(CmpOp::Eq);
            condition::comparison(op, receiver, built.remove(0), ctx, line)
        }
        "isZero" => {
            expect_arity(method, args, 0, line)?;
            Ok(IrExpr::call("Address.isZero", Some(receiver), vec![], SemType::Bool))
        }
        other => Err(Error::unsupported(format!("method `{}` on Address", other), line)),
    }
}

/// Methods on a `Str` receiver
pub fn str_method(
    receiver: IrExpr,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    match method {
        "length" => {
            expect_arity(method, args, 0, line)?;
            Ok(IrExpr::call("Str.length", Some(receiver), vec![], SemType::U256))
        }
        "equals" => {
            expect_arity(method, args, 1, line)?;
            let mut built = build_args(args, ctx)?;
            condition::comparison(CmpOp::Eq, receiver, built.remove(0), ctx, line)
        }
        other => Err(Error::unsupported(format!("method `{}` on Str", other), line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Expr {
        Expr::new(ExprKind::Str(s.into()), 1)
    }

    #[test]
    fn test_address_literal_validated() {
        let good = lit("0x000000000000000000000000000000000000dEaD");
        assert!(factory_call("AddressFactory", "fromString", &[good], 1).is_ok());
        let bad = lit("0x1234");
        let err = factory_call("AddressFactory", "fromString", &[bad], 3).unwrap_err();
        assert!(matches!(err, Error::MalformedFactoryCall { line: 3, .. }));
    }

    #[test]
    fn test_str_factory() {
        let ir = factory_call("StrFactory", "fromString", &[lit("hello")], 1).unwrap();
        assert_eq!(ir.ty, SemType::Str);
        assert_eq!(ir.call_target(), Some("StrFactory.fromString"));
    }

    #[test]
    fn test_globals() {
        assert_eq!(global_member("msg", "sender", 1).unwrap().ty, SemType::Address);
        assert_eq!(global_member("block", "number", 1).unwrap().ty, SemType::U256);
        assert!(global_member("msg", "data", 1).is_err());
    }
}
