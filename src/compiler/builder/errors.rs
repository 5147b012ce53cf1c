//! Custom errors: `const Name = ErrorFactory.create<[A, B]>()` and
//! `Name.revert(a, b)`

use super::{build_args, check_value, types, IrBuilder};
use crate::compiler::abi::selector;
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrErrorDecl, IrErrorField, IrStmt, SemType};
use crate::error::{Error, Result};
use crate::parser::{ConstDecl, Expr, ExprKind, TypeRef};

/// Whether a top-level const is an error declaration
pub fn is_error_decl(decl: &ConstDecl) -> bool {
    match &decl.value.kind {
        ExprKind::Call { callee, .. } => matches!(
            &callee.kind,
            ExprKind::Member { object, property }
                if property == "create" && object.as_identifier() == Some("ErrorFactory")
        ),
        _ => false,
    }
}

/// Builds one error declaration
pub struct ErrorBuilder<'a> {
    decl: &'a ConstDecl,
}

impl<'a> ErrorBuilder<'a> {
    /// Wraps an `ErrorFactory.create` const
    pub fn new(decl: &'a ConstDecl) -> Self {
        ErrorBuilder { decl }
    }

    /// The tuple of argument types, or why the call is malformed
    fn argument_types(&self) -> Result<&'a [TypeRef]> {
        let line = self.decl.line;
        match &self.decl.value.kind {
            ExprKind::Call {
                type_args, args, ..
            } => {
                if !args.is_empty() {
                    return Err(Error::malformed_factory(
                        "ErrorFactory",
                        "`create` takes no arguments",
                        line,
                    ));
                }
                match type_args.as_slice() {
                    [TypeRef::Tuple(items)] => Ok(items),
                    [] => Ok(&[]),
                    _ => Err(Error::malformed_factory(
                        "ErrorFactory",
                        "expected a tuple type argument like `<[Address, U256]>`",
                        line,
                    )),
                }
            }
            _ => Err(Error::malformed_factory(
                "ErrorFactory",
                "expected `ErrorFactory.create<[...]>()`",
                line,
            )),
        }
    }
}

impl IrBuilder for ErrorBuilder<'_> {
    type Output = IrErrorDecl;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        match self.argument_types() {
            Ok(items) => items
                .iter()
                .fold(true, |ok, ty| types::check_type(ty, ctx, self.decl.line) && ok),
            // Reported as a hard failure by build_ir
            Err(_) => true,
        }
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrErrorDecl> {
        let items = self.argument_types()?;
        let mut fields = Vec::with_capacity(items.len());
        for (i, ty) in items.iter().enumerate() {
            fields.push(IrErrorField {
                name: format!("arg{}", i),
                ty: types::resolve_type(ty, ctx, self.decl.line)?,
            });
        }
        let field_types: Vec<SemType> = fields.iter().map(|f| f.ty.clone()).collect();
        let signature = selector::signature(&self.decl.name, &field_types, &ctx.symbols);
        tracing::debug!(error = %self.decl.name, %signature, "custom error declared");
        Ok(IrErrorDecl {
            name: self.decl.name.clone(),
            fields,
            selector: selector::selector(&signature),
        })
    }
}

/// `Name.revert(args)` as a statement
pub fn revert(
    error: &str,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrStmt> {
    if method != "revert" {
        return Err(Error::unsupported(
            format!("`{}.{}` (errors only support `revert`)", error, method),
            line,
        ));
    }
    let decl = ctx
        .error_decl(error)
        .cloned()
        .ok_or_else(|| Error::UndefinedSymbol {
            name: error.to_string(),
            line,
        })?;
    if args.len() != decl.fields.len() {
        return Err(Error::unsupported(
            format!(
                "`{}.revert` expects {} argument(s), got {}",
                error,
                decl.fields.len(),
                args.len()
            ),
            line,
        ));
    }
    let mut built = build_args(args, ctx)?;
    for (value, field) in built.iter_mut().zip(&decl.fields) {
        check_value(ctx, &format!("{}.{}", error, field.name), &field.ty, value, line);
    }
    Ok(IrStmt::Revert {
        error: error.to_string(),
        args: built,
    })
}
