//! IR builders
//!
//! Each builder wraps one syntax node, records diagnostics in
//! [`IrBuilder::validate`] and produces its IR node in
//! [`IrBuilder::build_ir`]. Building continues after a failed validation; the
//! compiler's [`ValidationMode`](crate::compiler::ValidationMode) decides
//! whether the result is emitted.

pub mod argument;
pub mod array;
pub mod binary;
pub mod builtins;
pub mod condition;
pub mod contract;
pub mod errors;
pub mod events;
pub mod expression;
pub mod inheritance;
pub mod interfaces;
pub mod loops;
pub mod mapping;
pub mod method;
pub mod statement;
pub mod structs;
pub mod types;
pub mod variable;
pub mod wide_int;

pub use contract::ContractBuilder;
pub use expression::{build_expr, ExpressionBuilder};
pub use inheritance::{AnalysisSession, ResolvedParent};
pub use method::{ConstructorBuilder, MethodBuilder};
pub use statement::{build_block, StatementBuilder};

use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::SemanticCode;
use crate::compiler::ir::{IrExpr, IrExprKind, Literal, SemType, StateMutability};
use crate::error::{Error, Result};
use crate::parser::Expr;

/// Validate-then-build protocol shared by all builders
pub trait IrBuilder {
    /// IR node produced
    type Output;

    /// Records diagnostics; returns false when anything was recorded
    fn validate(&mut self, ctx: &mut CompilationContext) -> bool;

    /// Produces the IR node
    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<Self::Output>;

    /// Runs [`validate`](Self::validate) and then [`build_ir`](Self::build_ir)
    fn validate_and_build_ir(&mut self, ctx: &mut CompilationContext) -> Result<Self::Output> {
        if !self.validate(ctx) {
            tracing::debug!(file = %ctx.file, "validation recorded diagnostics; continuing build");
        }
        self.build_ir(ctx)
    }
}

/// Records E015 when a pure method reads storage
pub(crate) fn note_storage_read(ctx: &mut CompilationContext, field: &str, line: usize) {
    if ctx.current_mutability() == Some(StateMutability::Pure) {
        let method = ctx.current_method_name();
        ctx.semantic_error(
            SemanticCode::StorageReadInPure,
            line,
            &[method, field.to_string()],
        );
    }
}

/// Records E014 when a view or pure method writes storage
pub(crate) fn note_storage_write(ctx: &mut CompilationContext, field: &str, line: usize) {
    let label = match ctx.current_mutability() {
        Some(StateMutability::View) => "View",
        Some(StateMutability::Pure) => "Pure",
        _ => return,
    };
    let method = ctx.current_method_name();
    ctx.semantic_error(
        SemanticCode::StorageWriteInReadOnly,
        line,
        &[label.to_string(), method, field.to_string()],
    );
}

/// Records E019 when `value` cannot be stored in `target`
pub(crate) fn check_assignable(
    ctx: &mut CompilationContext,
    name: &str,
    target: &SemType,
    value: &SemType,
    line: usize,
) -> bool {
    if types::assignable(target, value) {
        return true;
    }
    ctx.semantic_error(
        SemanticCode::TypeMismatch,
        line,
        &[name.to_string(), value.to_string(), target.to_string()],
    );
    false
}

/// Integer literals take the signedness of the wide integer they meet
pub(crate) fn coerce_literal(value: &mut IrExpr, target: &SemType) {
    if let IrExprKind::Literal(Literal::Int(text)) = &value.kind {
        if value.ty != *target
            && target.is_wide_int()
            && wide_int::check_int_literal(text, target.is_signed()).is_ok()
        {
            value.ty = target.clone();
        }
    }
}

/// [`coerce_literal`], then [`check_assignable`]
pub(crate) fn check_value(
    ctx: &mut CompilationContext,
    name: &str,
    target: &SemType,
    value: &mut IrExpr,
    line: usize,
) -> bool {
    coerce_literal(value, target);
    check_assignable(ctx, name, target, &value.ty, line)
}

/// Fails unless exactly `expected` arguments were passed
pub(crate) fn expect_arity(what: &str, args: &[Expr], expected: usize, line: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::unsupported(
            format!(
                "`{}` expects {} argument(s), got {}",
                what,
                expected,
                args.len()
            ),
            line,
        ))
    }
}

/// Builds every argument, left to right
pub(crate) fn build_args(args: &[Expr], ctx: &mut CompilationContext) -> Result<Vec<IrExpr>> {
    args.iter().map(|a| build_expr(a, ctx)).collect()
}
