//! `@Interface` declarations and calls to other contracts

use super::{build_args, build_expr, check_assignable, check_value, expect_arity, types, IrBuilder};
use crate::compiler::abi::selector;
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SyntaxCode, SemanticCode};
use crate::compiler::ir::{
    IrExpr, IrExprKind, IrInterface, IrInterfaceMethod, IrParam, SemType, StateMutability,
};
use crate::error::{Error, Result};
use crate::parser::{ClassDecl, Decorator, Expr};

fn mutability_of(decorators: &[Decorator]) -> Vec<StateMutability> {
    decorators
        .iter()
        .filter_map(|d| match d.name.as_str() {
            "View" => Some(StateMutability::View),
            "Pure" => Some(StateMutability::Pure),
            "Payable" => Some(StateMutability::Payable),
            "Nonpayable" => Some(StateMutability::Nonpayable),
            _ => None,
        })
        .collect()
}

/// Builds one `@Interface` class
pub struct InterfaceBuilder<'a> {
    class: &'a ClassDecl,
}

impl<'a> InterfaceBuilder<'a> {
    /// Wraps an interface class
    pub fn new(class: &'a ClassDecl) -> Self {
        InterfaceBuilder { class }
    }
}

impl IrBuilder for InterfaceBuilder<'_> {
    type Output = IrInterface;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        if self.class.name.is_none() {
            ctx.syntax_error(
                SyntaxCode::MissingClassName,
                self.class.line,
                &["Interface".into()],
            );
        }
        for method in self.class.methods() {
            if method.body.is_some() {
                tracing::warn!(method = %method.name, "interface method body ignored");
            }
            if mutability_of(&method.decorators).len() > 1 {
                ctx.semantic_error(
                    SemanticCode::MultipleDecorators,
                    method.line,
                    &[method.name.clone(), "mutability".into()],
                );
            }
            for param in &method.params {
                match &param.ty {
                    None => ctx.syntax_error(
                        SyntaxCode::MissingTypeAnnotation,
                        param.line,
                        &[param.name.clone()],
                    ),
                    Some(ty) => {
                        types::check_type(ty, ctx, param.line);
                    }
                }
            }
            if let Some(ret) = &method.return_type {
                types::check_type(ret, ctx, method.line);
            }
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrInterface> {
        let name = self.class.display_name().to_string();
        let mut methods = Vec::new();
        for method in self.class.methods() {
            let mut inputs = Vec::with_capacity(method.params.len());
            for param in &method.params {
                let Some(ty) = &param.ty else { continue };
                inputs.push(IrParam {
                    name: param.name.clone(),
                    ty: types::resolve_type(ty, ctx, param.line)?,
                });
            }
            let output = types::resolve_return(method.return_type.as_ref(), ctx, method.line)?;
            let input_types: Vec<SemType> = inputs.iter().map(|p| p.ty.clone()).collect();
            let signature = selector::signature(&method.name, &input_types, &ctx.symbols);
            methods.push(IrInterfaceMethod {
                name: method.name.clone(),
                selector: selector::selector(&signature),
                inputs,
                output,
                mutability: mutability_of(&method.decorators)
                    .first()
                    .copied()
                    .unwrap_or_default(),
            });
        }
        Ok(IrInterface { name, methods })
    }
}

/// `IToken.at(address)`
pub fn cast(
    interface: &str,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    if method != "at" {
        return Err(Error::unsupported(
            format!("`{}.{}` (interfaces are bound with `at`)", interface, method),
            line,
        ));
    }
    expect_arity("at", args, 1, line)?;
    let address = build_expr(&args[0], ctx)?;
    check_assignable(ctx, interface, &SemType::Address, &address.ty, line);
    Ok(IrExpr::new(
        IrExprKind::InterfaceCast {
            interface: interface.to_string(),
            address: Box::new(address),
        },
        SemType::Interface(interface.to_string()),
    ))
}

/// `token.balanceOf(owner)` on an interface-typed value
pub fn call(
    interface: &str,
    receiver: IrExpr,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let decl = ctx
        .interface(interface)
        .and_then(|i| i.method(method))
        .cloned()
        .ok_or_else(|| Error::UndefinedSymbol {
            name: format!("{}.{}", interface, method),
            line,
        })?;
    expect_arity(method, args, decl.inputs.len(), line)?;
    let mut built = build_args(args, ctx)?;
    for (value, param) in built.iter_mut().zip(&decl.inputs) {
        check_value(ctx, &param.name, &param.ty, value, line);
    }
    Ok(IrExpr::call(
        format!("{}.{}", interface, method),
        Some(receiver),
        built,
        decl.output.unwrap_or(SemType::Void),
    ))
}
