//! 256-bit integer factories and methods

use lazy_static::lazy_static;
use regex::Regex;

use super::{build_args, check_value, condition, expect_arity};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{CmpOp, IrExpr, IrExprKind, Literal, SemType};
use crate::error::{Error, Result};
use crate::parser::{Expr, ExprKind};

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
    static ref HEX: Regex = Regex::new(r"^-?0[xX][0-9a-fA-F]+$").unwrap();
}

/// 2^256 - 1
const U256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";
/// 2^255
const I256_LIMIT: &str =
    "57896044618658097711785492504343953926634992332820282019728792003956564819968";

/// Compares two unsigned decimal strings without leading zeros
fn decimal_le(a: &str, b: &str) -> bool {
    a.len() < b.len() || (a.len() == b.len() && a <= b)
}

/// Checks that `text` is a decimal or hex literal representable in 256 bits
pub fn check_int_literal(text: &str, signed: bool) -> std::result::Result<(), String> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if negative && !signed {
        return Err(format!("negative literal `{}` for an unsigned integer", text));
    }

    if HEX.is_match(text) {
        let body = digits[2..].trim_start_matches('0');
        let max_bits = if signed { 255 } else { 256 };
        let bits = match body.chars().next() {
            None => 0,
            Some(first) => {
                let lead = first.to_digit(16).unwrap_or(0);
                (body.len() - 1) * 4 + (32 - lead.leading_zeros()) as usize
            }
        };
        return if bits <= max_bits {
            Ok(())
        } else {
            Err(format!("literal `{}` does not fit in 256 bits", text))
        };
    }

    if !DECIMAL.is_match(text) {
        return Err(format!("`{}` is not an integer literal", text));
    }
    let trimmed = match digits.trim_start_matches('0') {
        "" => "0",
        t => t,
    };
    let fits = if !signed {
        decimal_le(trimmed, U256_MAX)
    } else if negative {
        decimal_le(trimmed, I256_LIMIT)
    } else {
        decimal_le(trimmed, I256_LIMIT) && trimmed != I256_LIMIT
    };
    if fits {
        Ok(())
    } else {
        Err(format!("literal `{}` does not fit in 256 bits", text))
    }
}

/// `U256Factory.create()` / `U256Factory.fromString("...")` and the `I256`
/// equivalents
pub fn factory_call(factory: &str, method: &str, args: &[Expr], line: usize) -> Result<IrExpr> {
    let ty = if factory == "I256Factory" {
        SemType::I256
    } else {
        SemType::U256
    };
    match method {
        "create" => {
            if !args.is_empty() {
                return Err(Error::malformed_factory(
                    factory,
                    "`create` takes no arguments",
                    line,
                ));
            }
            Ok(IrExpr::call(format!("{}.create", factory), None, vec![], ty))
        }
        "fromString" => {
            let text = match args {
                [Expr {
                    kind: ExprKind::Str(s),
                    ..
                }] => s,
                _ => {
                    return Err(Error::malformed_factory(
                        factory,
                        "`fromString` expects one string literal",
                        line,
                    ))
                }
            };
            check_int_literal(text, ty.is_signed())
                .map_err(|reason| Error::malformed_factory(factory, reason, line))?;
            let arg = IrExpr::new(IrExprKind::Literal(Literal::Str(text.clone())), SemType::Str);
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

const ARITHMETIC: &[&str] = &["add", "sub", "mul", "div", "mod"];

/// Method call on a `U256` or `I256` receiver
pub fn method_call(
    receiver: IrExpr,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let ty = receiver.ty.clone();
    let prefix = if ty.is_signed() { "I256" } else { "U256" };

    let base = method.strip_suffix("Unchecked").unwrap_or(method);
    if ARITHMETIC.contains(&base) {
        expect_arity(method, args, 1, line)?;
        let mut operand = build_args(args, ctx)?.remove(0);
        check_value(ctx, method, &ty, &mut operand, line);
        return Ok(IrExpr::call(
            format!("{}.{}", prefix, method),
            Some(receiver),
            vec![operand],
            ty,
        ));
    }

    if let Some(op) = CmpOp::from_method(method) {
        expect_arity(method, args, 1, line)?;
        let mut built = build_args(args, ctx)?;
        return condition::comparison(op, receiver, built.remove(0), ctx, line);
    }

    let (result, signed_only) = match method {
        "toString" => (SemType::Str, false),
        "isZero" => (SemType::Bool, false),
        "negate" | "abs" => (SemType::I256, true),
        "isNegative" => (SemType::Bool, true),
        _ => {
            return Err(Error::unsupported(
                format!("method `{}` on {}", method, ty),
                line,
            ))
        }
    };
    if signed_only && !ty.is_signed() {
        return Err(Error::unsupported(format!("method `{}` on U256", method), line));
    }
    expect_arity(method, args, 0, line)?;
    Ok(IrExpr::call(
        format!("{}.{}", prefix, method),
        Some(receiver),
        vec![],
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_bounds() {
        assert!(check_int_literal("0", false).is_ok());
        assert!(check_int_literal(U256_MAX, false).is_ok());
        assert!(check_int_literal(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936",
            false
        )
        .is_err());
        assert!(check_int_literal("-1", false).is_err());
        assert!(check_int_literal(&format!("-{}", I256_LIMIT), true).is_ok());
        assert!(check_int_literal(I256_LIMIT, true).is_err());
    }

    #[test]
    fn test_hex_bounds() {
        let max = format!("0x{}", "f".repeat(64));
        assert!(check_int_literal(&max, false).is_ok());
        assert!(check_int_literal(&format!("0x1{}", "0".repeat(64)), false).is_err());
        assert!(check_int_literal(&max, true).is_err());
        assert!(check_int_literal("0x7f", true).is_ok());
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(check_int_literal("12a", false).is_err());
        assert!(check_int_literal("", false).is_err());
    }

    #[test]
    fn test_from_string_requires_literal() {
        let arg = Expr::new(ExprKind::Identifier("x".into()), 1);
        let err = factory_call("U256Factory", "fromString", &[arg], 1).unwrap_err();
        assert!(matches!(err, Error::MalformedFactoryCall { .. }));

        let ok = Expr::new(ExprKind::Str("42".into()), 1);
        let ir = factory_call("U256Factory", "fromString", &[ok], 1).unwrap();
        assert_eq!(ir.call_target(), Some("U256Factory.fromString"));
        assert_eq!(ir.ty, SemType::U256);
    }

    #[test]
    fn test_signed_receiver_accepts_plain_literal() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let recv = IrExpr::int("-5", SemType::I256);
        let arg = Expr::new(ExprKind::Number("1".into()), 1);
        let ir = method_call(recv.clone(), "add", &[arg], &mut ctx, 1).unwrap();
        assert_eq!(ir.call_target(), Some("I256.add"));
        assert!(ctx.diagnostics.is_empty());

        let zero = Expr::new(ExprKind::Number("0".into()), 1);
        let cond = method_call(recv, "lessThan", &[zero], &mut ctx, 1).unwrap();
        assert_eq!(cond.ty, SemType::Bool);
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_unchecked_variant_keeps_name() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let recv = IrExpr::int("1", SemType::U256);
        let arg = Expr::new(ExprKind::Number("2".into()), 1);
        let ir = method_call(recv, "addUnchecked", &[arg], &mut ctx, 1).unwrap();
        assert_eq!(ir.call_target(), Some("U256.addUnchecked"));
    }
}
