//! Methods, the constructor and calls between methods
//!
//! Decorators select visibility (`@External`, `@Public`, `@Internal`),
//! mutability (`@View`, `@Pure`, `@Payable`, `@Nonpayable`) and the special
//! roles `@Fallback` / `@Receive`.

use super::argument::build_params;
use super::{build_args, build_block, check_value, types, IrBuilder};
use crate::compiler::context::{CompilationContext, MethodFrame};
use crate::compiler::diagnostics::SemanticCode;
use crate::compiler::ir::{
    IrConstructor, IrExpr, IrMethod, IrParam, IrStmt, MethodRole, SemType, StateMutability,
    Visibility,
};
use crate::compiler::symbols::FunctionInfo;
use crate::error::{Error, Result};
use crate::parser::{Block, ConstructorDecl, Decorator, Expr, MethodDecl, Param};

/// Decorators of one method, sorted by kind
#[derive(Debug, Default)]
struct DecoratorSet {
    visibility: Vec<Visibility>,
    mutability: Vec<StateMutability>,
    role: Vec<MethodRole>,
}

impl DecoratorSet {
    fn collect(decorators: &[Decorator]) -> Self {
        let mut set = DecoratorSet::default();
        for d in decorators {
            match d.name.as_str() {
                "External" => set.visibility.push(Visibility::External),
                "Public" => set.visibility.push(Visibility::Public),
                "Internal" => set.visibility.push(Visibility::Internal),
                "View" => set.mutability.push(StateMutability::View),
                "Pure" => set.mutability.push(StateMutability::Pure),
                "Payable" => set.mutability.push(StateMutability::Payable),
                "Nonpayable" => set.mutability.push(StateMutability::Nonpayable),
                "Fallback" => set.role.push(MethodRole::Fallback),
                "Receive" => set.role.push(MethodRole::Receive),
                other => tracing::warn!(decorator = other, "unknown method decorator ignored"),
            }
        }
        set
    }

    fn role(&self) -> MethodRole {
        self.role.first().copied().unwrap_or_default()
    }

    fn visibility(&self) -> Visibility {
        self.visibility.first().copied().unwrap_or_default()
    }

    fn mutability(&self) -> StateMutability {
        match self.mutability.first() {
            Some(m) => *m,
            None if self.role() == MethodRole::Receive => StateMutability::Payable,
            None => StateMutability::Nonpayable,
        }
    }
}

/// Builds one contract method
pub struct MethodBuilder<'a> {
    method: &'a MethodDecl,
}

impl<'a> MethodBuilder<'a> {
    /// Wraps a method declaration
    pub fn new(method: &'a MethodDecl) -> Self {
        MethodBuilder { method }
    }

    /// Signature for the contract scope, resolved before any body is built
    pub fn signature(&self, ctx: &CompilationContext) -> Result<FunctionInfo> {
        let decorators = DecoratorSet::collect(&self.method.decorators);
        let mut params = Vec::with_capacity(self.method.params.len());
        for p in &self.method.params {
            params.push(match &p.ty {
                Some(ty) => types::resolve_type(ty, ctx, p.line)?,
                None => SemType::U256,
            });
        }
        Ok(FunctionInfo {
            name: self.method.name.clone(),
            return_type: types::resolve_return(
                self.method.return_type.as_ref(),
                ctx,
                self.method.line,
            )?,
            params,
            visibility: decorators.visibility(),
            mutability: decorators.mutability(),
        })
    }
}

impl IrBuilder for MethodBuilder<'_> {
    type Output = IrMethod;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        let method = &self.method;
        let set = DecoratorSet::collect(&method.decorators);
        for (kind, count) in [
            ("visibility", set.visibility.len()),
            ("mutability", set.mutability.len()),
            ("role", set.role.len()),
        ] {
            if count > 1 {
                ctx.semantic_error(
                    SemanticCode::MultipleDecorators,
                    method.line,
                    &[method.name.clone(), kind.to_string()],
                );
            }
        }

        let role = set.role();
        if role != MethodRole::Regular {
            let mut conflict = |reason: &str| {
                ctx.semantic_error(
                    SemanticCode::ConflictingDecorators,
                    method.line,
                    &[method.name.clone(), reason.to_string()],
                )
            };
            if set.visibility.contains(&Visibility::Internal) {
                conflict("fallback/receive methods cannot be internal");
            }
            if set.mutability.iter().any(|m| m.is_read_only()) {
                conflict("fallback/receive methods cannot be view or pure");
            }
            if role == MethodRole::Receive
                && (!method.params.is_empty() || method.return_type.is_some())
            {
                conflict("receive takes no parameters and returns nothing");
            }
        }

        if let Some(ret) = &method.return_type {
            types::check_type(ret, ctx, method.line);
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrMethod> {
        let method = self.method;
        let body = method.body.as_ref().ok_or_else(|| {
            Error::unsupported(format!("method `{}` without a body", method.name), method.line)
        })?;
        let set = DecoratorSet::collect(&method.decorators);
        let output = types::resolve_return(method.return_type.as_ref(), ctx, method.line)?;
        let frame = MethodFrame {
            name: method.name.clone(),
            mutability: set.mutability(),
            visibility: set.visibility(),
            return_type: output.clone(),
        };

        let (inputs, stmts) = build_frame(frame, &method.params, body, ctx)?;

        if output.is_some() && !stmts.last().map(IrStmt::always_exits).unwrap_or(false) {
            ctx.semantic_error(
                SemanticCode::MissingReturn,
                method.line,
                &[method.name.clone()],
            );
        }
        tracing::debug!(method = %method.name, statements = stmts.len(), "method built");

        Ok(IrMethod {
            name: method.name.clone(),
            visibility: set.visibility(),
            mutability: set.mutability(),
            role: set.role(),
            inputs,
            output,
            body: stmts,
        })
    }
}

/// Builds parameters and body under `frame`, restoring the context after
fn build_frame(
    frame: MethodFrame,
    params: &[Param],
    body: &Block,
    ctx: &mut CompilationContext,
) -> Result<(Vec<IrParam>, Vec<IrStmt>)> {
    ctx.method = Some(frame);
    ctx.symbols.enter_scope();
    let result = build_params(params, ctx).and_then(|inputs| {
        let stmts = build_block(body, ctx)?;
        Ok((inputs, stmts))
    });
    ctx.symbols.exit_scope()?;
    ctx.method = None;
    result
}

/// Builds the constructor
pub struct ConstructorBuilder<'a> {
    ctor: &'a ConstructorDecl,
}

impl<'a> ConstructorBuilder<'a> {
    /// Wraps a constructor declaration
    pub fn new(ctor: &'a ConstructorDecl) -> Self {
        ConstructorBuilder { ctor }
    }
}

impl IrBuilder for ConstructorBuilder<'_> {
    type Output = IrConstructor;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        let line = self.ctor.line;
        let set = DecoratorSet::collect(&self.ctor.decorators);
        if set.mutability.len() > 1 {
            ctx.semantic_error(
                SemanticCode::MultipleDecorators,
                line,
                &["constructor".to_string(), "mutability".to_string()],
            );
        }
        if set.mutability.iter().any(|m| m.is_read_only()) {
            ctx.semantic_error(
                SemanticCode::ConflictingDecorators,
                line,
                &["constructor".to_string(), "constructors cannot be view or pure".to_string()],
            );
        }
        if !set.visibility.is_empty() || !set.role.is_empty() {
            ctx.semantic_error(
                SemanticCode::ConflictingDecorators,
                line,
                &[
                    "constructor".to_string(),
                    "constructors take only @Payable or @Nonpayable".to_string(),
                ],
            );
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrConstructor> {
        let payable = DecoratorSet::collect(&self.ctor.decorators)
            .mutability
            .first()
            .is_some_and(|m| *m == StateMutability::Payable);
        let frame = MethodFrame {
            name: "constructor".into(),
            mutability: if payable {
                StateMutability::Payable
            } else {
                StateMutability::Nonpayable
            },
            visibility: Visibility::Public,
            return_type: None,
        };
        let (inputs, body) = build_frame(frame, &self.ctor.params, &self.ctor.body, ctx)?;
        Ok(IrConstructor {
            inputs,
            body,
            payable,
        })
    }
}

/// `this.helper(args)`; only internal methods may be called this way
pub fn internal_call(
    name: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    let info = ctx
        .symbols
        .lookup_function(name)
        .cloned()
        .ok_or_else(|| Error::UndefinedSymbol {
            name: format!("this.{}", name),
            line,
        })?;
    if info.visibility.is_exported() {
        ctx.semantic_error(SemanticCode::ExternalSelfCall, line, &[name.to_string()]);
    }
    if args.len() != info.params.len() {
        return Err(Error::unsupported(
            format!(
                "`{}` expects {} argument(s), got {}",
                name,
                info.params.len(),
                args.len()
            ),
            line,
        ));
    }
    let mut built = build_args(args, ctx)?;
    for (i, (value, expected)) in built.iter_mut().zip(&info.params).enumerate() {
        check_value(ctx, &format!("{}#{}", name, i), expected, value, line);
    }
    Ok(IrExpr::call(
        format!("this.{}", name),
        None,
        built,
        info.return_type.unwrap_or(SemType::Void),
    ))
}
