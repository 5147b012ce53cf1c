//! Type annotation resolution

use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::SemanticCode;
use crate::compiler::ir::SemType;
use crate::error::{Error, Result};
use crate::parser::TypeRef;

/// Names that parse as types but are never accepted
const UNSUPPORTED_TYPES: &[&str] = &[
    "any", "number", "string", "unknown", "object", "bigint", "never", "undefined", "null",
];

fn is_bool_name(name: &str) -> bool {
    matches!(name, "boolean" | "Boolean" | "bool")
}

/// Records E001 for every unsupported name inside `ty`; returns false when
/// anything was recorded
pub fn check_type(ty: &TypeRef, ctx: &mut CompilationContext, line: usize) -> bool {
    match ty {
        TypeRef::Named { name, args } => {
            if UNSUPPORTED_TYPES.contains(&name.as_str()) {
                ctx.semantic_error(SemanticCode::UnsupportedType, line, &[name.clone()]);
                return false;
            }
            let mut ok = args.iter().all(|a| check_type(a, ctx, line));
            if ok && matches!(name.as_str(), "Mapping" | "MappingNested") {
                if let Some(value) = args.last() {
                    let scalar = matches!(
                        value,
                        TypeRef::Named { name, args } if args.is_empty() && is_scalar_name(name)
                    );
                    if !scalar {
                        ctx.semantic_error(SemanticCode::UnsupportedType, line, &[ty.to_string()]);
                        ok = false;
                    }
                }
            }
            ok
        }
        TypeRef::Array(inner) => check_type(inner, ctx, line),
        TypeRef::Tuple(_) => {
            ctx.semantic_error(SemanticCode::UnsupportedType, line, &[ty.to_string()]);
            false
        }
        TypeRef::Literal(_) => true,
    }
}

fn is_scalar_name(name: &str) -> bool {
    matches!(name, "U256" | "I256" | "Address" | "Str") || is_bool_name(name)
}

/// Resolves an annotation to a semantic type
///
/// Names already reported by [`check_type`] degrade to `U256` (the ABI
/// default) so that best-effort builds can continue; names that are not
/// known at all are hard errors.
pub fn resolve_type(ty: &TypeRef, ctx: &CompilationContext, line: usize) -> Result<SemType> {
    match ty {
        TypeRef::Named { name, args } => resolve_named(name, args, ty, ctx, line),
        TypeRef::Array(inner) => Ok(SemType::DynamicArray(Box::new(resolve_type(
            inner, ctx, line,
        )?))),
        TypeRef::Tuple(_) | TypeRef::Literal(_) => {
            Err(Error::unsupported(format!("type `{}`", ty), line))
        }
    }
}

fn resolve_named(
    name: &str,
    args: &[TypeRef],
    whole: &TypeRef,
    ctx: &CompilationContext,
    line: usize,
) -> Result<SemType> {
    let arity = |n: usize| -> Result<()> {
        if args.len() == n {
            Ok(())
        } else {
            Err(Error::unsupported(
                format!("type `{}` expects {} type argument(s)", whole, n),
                line,
            ))
        }
    };

    let ty = match name {
        "U256" => SemType::U256,
        "I256" => SemType::I256,
        "Address" => SemType::Address,
        "Str" => SemType::Str,
        "void" => SemType::Void,
        n if is_bool_name(n) => SemType::Bool,
        "Mapping" => {
            arity(2)?;
            SemType::Mapping {
                key: Box::new(resolve_type(&args[0], ctx, line)?),
                value: Box::new(resolve_type(&args[1], ctx, line)?),
            }
        }
        "MappingNested" => {
            arity(3)?;
            SemType::MappingNested {
                key1: Box::new(resolve_type(&args[0], ctx, line)?),
                key2: Box::new(resolve_type(&args[1], ctx, line)?),
                value: Box::new(resolve_type(&args[2], ctx, line)?),
            }
        }
        "StaticArray" => {
            arity(2)?;
            let length = match &args[1] {
                TypeRef::Literal(n) => *n,
                other => {
                    return Err(Error::unsupported(
                        format!("array length `{}` must be a number", other),
                        line,
                    ))
                }
            };
            SemType::StaticArray {
                element: Box::new(resolve_type(&args[0], ctx, line)?),
                length,
            }
        }
        "Array" => {
            arity(1)?;
            SemType::DynamicArray(Box::new(resolve_type(&args[0], ctx, line)?))
        }
        n if UNSUPPORTED_TYPES.contains(&n) => {
            tracing::warn!(type_name = n, line, "unsupported type degraded to U256");
            SemType::U256
        }
        n if ctx.symbols.struct_template(n).is_some() || ctx.pending_structs.contains(n) => {
            SemType::Struct(n.to_string())
        }
        n if ctx.interface(n).is_some() => SemType::Interface(n.to_string()),
        n => {
            return Err(Error::UnknownType {
                name: n.to_string(),
                line,
            })
        }
    };
    Ok(ty)
}

/// Resolves an optional method return annotation; absent means void
pub fn resolve_return(
    ty: Option<&TypeRef>,
    ctx: &CompilationContext,
    line: usize,
) -> Result<Option<SemType>> {
    match ty {
        None => Ok(None),
        Some(t) => match resolve_type(t, ctx, line)? {
            SemType::Void => Ok(None),
            other => Ok(Some(other)),
        },
    }
}

/// Whether a value of type `value` can be stored where `target` is expected
pub fn assignable(target: &SemType, value: &SemType) -> bool {
    match (target, value) {
        (SemType::Address, SemType::Interface(_)) | (SemType::Interface(_), SemType::Address) => {
            true
        }
        (SemType::DynamicArray(a), SemType::StaticArray { element, .. }) => a == element,
        _ => target == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CompilationContext {
        CompilationContext::new("t.ts", "t.ts")
    }

    #[test]
    fn test_resolves_generic_storage_types() {
        let c = ctx();
        let ty = TypeRef::Named {
            name: "MappingNested".into(),
            args: vec![
                TypeRef::named("Address"),
                TypeRef::named("Address"),
                TypeRef::named("U256"),
            ],
        };
        assert_eq!(
            resolve_type(&ty, &c, 1).unwrap(),
            SemType::MappingNested {
                key1: Box::new(SemType::Address),
                key2: Box::new(SemType::Address),
                value: Box::new(SemType::U256),
            }
        );
        let arr = TypeRef::Named {
            name: "StaticArray".into(),
            args: vec![TypeRef::named("U256"), TypeRef::Literal(4)],
        };
        assert_eq!(
            resolve_type(&arr, &c, 1).unwrap(),
            SemType::StaticArray {
                element: Box::new(SemType::U256),
                length: 4
            }
        );
    }

    #[test]
    fn test_any_is_reported() {
        let mut c = ctx();
        assert!(!check_type(&TypeRef::named("any"), &mut c, 5));
        assert_eq!(c.diagnostics.semantic_errors()[0].code, "E001");
    }

    #[test]
    fn test_unknown_name_is_hard_error() {
        let c = ctx();
        let err = resolve_type(&TypeRef::named("Position"), &c, 9).unwrap_err();
        assert!(matches!(err, Error::UnknownType { line: 9, .. }));
    }

    #[test]
    fn test_mapping_of_struct_rejected() {
        let mut c = ctx();
        c.pending_structs.insert("Position".into());
        let ty = TypeRef::Named {
            name: "Mapping".into(),
            args: vec![TypeRef::named("Address"), TypeRef::named("Position")],
        };
        assert!(!check_type(&ty, &mut c, 2));
    }

    #[test]
    fn test_boolean_spellings() {
        let c = ctx();
        for n in ["boolean", "Boolean", "bool"] {
            assert_eq!(resolve_type(&TypeRef::named(n), &c, 1).unwrap(), SemType::Bool);
        }
    }
}
