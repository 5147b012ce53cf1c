//! Method and constructor parameters

use super::{types, IrBuilder};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{IrParam, SemType};
use crate::compiler::symbols::VariableInfo;
use crate::error::Result;
use crate::parser::Param;

/// Declares one parameter in the current method scope
pub struct ArgumentBuilder<'a> {
    param: &'a Param,
}

impl<'a> ArgumentBuilder<'a> {
    /// Wraps a parameter
    pub fn new(param: &'a Param) -> Self {
        ArgumentBuilder { param }
    }
}

impl IrBuilder for ArgumentBuilder<'_> {
    type Output = IrParam;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        match &self.param.ty {
            None => {
                ctx.syntax_error(
                    SyntaxCode::MissingTypeAnnotation,
                    self.param.line,
                    &[self.param.name.clone()],
                );
                false
            }
            Some(ty) => types::check_type(ty, ctx, self.param.line),
        }
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrParam> {
        let ty = match &self.param.ty {
            Some(ty) => types::resolve_type(ty, ctx, self.param.line)?,
            None => SemType::U256,
        };
        let info = VariableInfo::local(&self.param.name, ty.clone(), true);
        if !ctx.symbols.declare_variable(&self.param.name, info) {
            ctx.semantic_error(
                SemanticCode::DuplicateVariable,
                self.param.line,
                &[self.param.name.clone()],
            );
        }
        Ok(IrParam {
            name: self.param.name.clone(),
            ty,
        })
    }
}

/// Builds every parameter in order
pub fn build_params(params: &[Param], ctx: &mut CompilationContext) -> Result<Vec<IrParam>> {
    params
        .iter()
        .map(|p| ArgumentBuilder::new(p).validate_and_build_ir(ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TypeRef;

    #[test]
    fn test_params_declared_in_scope() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        ctx.symbols.enter_scope();
        let params = vec![
            Param {
                name: "to".into(),
                ty: Some(TypeRef::named("Address")),
                line: 1,
            },
            Param {
                name: "amount".into(),
                ty: Some(TypeRef::named("U256")),
                line: 1,
            },
        ];
        let built = build_params(&params, &mut ctx).unwrap();
        assert_eq!(built[0].ty, SemType::Address);
        assert!(ctx.symbols.lookup_variable("amount").is_some());
    }

    #[test]
    fn test_any_param_reported() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        ctx.symbols.enter_scope();
        let params = vec![Param {
            name: "x".into(),
            ty: Some(TypeRef::named("any")),
            line: 2,
        }];
        let built = build_params(&params, &mut ctx).unwrap();
        assert_eq!(built[0].ty, SemType::U256);
        assert_eq!(ctx.diagnostics.semantic_errors()[0].code, "E001");
    }
}
