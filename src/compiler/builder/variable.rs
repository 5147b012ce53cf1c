//! Local variable declarations

use super::{build_expr, check_value, types, IrBuilder};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{IrStmt, SemType};
use crate::compiler::symbols::VariableInfo;
use crate::error::{Error, Result};
use crate::parser::{Expr, TypeRef};

/// Builds `let name: T = init` / `const name = init`
pub struct VariableBuilder<'a> {
    name: &'a str,
    mutable: bool,
    ty: Option<&'a TypeRef>,
    init: Option<&'a Expr>,
    line: usize,
}

impl<'a> VariableBuilder<'a> {
    /// Wraps one declaration
    pub fn new(
        name: &'a str,
        mutable: bool,
        ty: Option<&'a TypeRef>,
        init: Option<&'a Expr>,
        line: usize,
    ) -> Self {
        VariableBuilder {
            name,
            mutable,
            ty,
            init,
            line,
        }
    }
}

impl IrBuilder for VariableBuilder<'_> {
    type Output = IrStmt;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        match (self.ty, self.init) {
            (None, None) => {
                ctx.syntax_error(
                    SyntaxCode::MissingTypeAnnotation,
                    self.line,
                    &[self.name.to_string()],
                );
                false
            }
            (Some(ty), _) => types::check_type(ty, ctx, self.line),
            (None, Some(_)) => true,
        }
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrStmt> {
        let mut init = match self.init {
            Some(expr) => Some(build_expr(expr, ctx)?),
            None => None,
        };
        let ty = match (self.ty, &init) {
            (Some(ty), _) => types::resolve_type(ty, ctx, self.line)?,
            (None, Some(value)) if value.ty == SemType::Void => {
                return Err(Error::unsupported(
                    format!("`{}` initialized from a void call", self.name),
                    self.line,
                ))
            }
            (None, Some(value)) => value.ty.clone(),
            (None, None) => SemType::U256,
        };
        if let Some(value) = init.as_mut() {
            check_value(ctx, self.name, &ty, value, self.line);
        }

        let info = VariableInfo::local(self.name, ty.clone(), self.mutable);
        if !ctx.symbols.declare_variable(self.name, info) {
            ctx.semantic_error(
                SemanticCode::DuplicateVariable,
                self.line,
                &[self.name.to_string()],
            );
        }
        Ok(IrStmt::Let {
            name: self.name.to_string(),
            ty,
            init,
        })
    }
}
