//! IR to target-source lowering
//!
//! Every IR expression lowers to an [`EmitResult`]: the lines that must run
//! first plus the value expression. Parents prepend child setup in evaluation
//! order (receiver, then arguments left to right) and never inline setup into
//! a value. `call` nodes are routed through an ordered list of
//! [`CallTransformer`]s; the first one whose `can_handle` accepts the target
//! wins.

mod call;
mod collection;
mod literal;
pub mod names;
mod statement;
mod value;
mod wide_int;

pub use literal::string_bytes;
pub use wide_int::comparison_handler;

use crate::compiler::ir::{IrExpr, IrExprKind, IrStmt, IrUnaryOp, LogicOp, SemType, VarScope};

/// Lowered expression
#[derive(Debug, Clone, PartialEq)]
pub struct EmitResult {
    /// Lines to run before `value_expr` is evaluated
    pub setup_lines: Vec<String>,
    /// Target expression producing the value
    pub value_expr: String,
    /// Semantic type of the value
    pub value_type: SemType,
}

impl EmitResult {
    /// Value without setup
    pub fn value(value_expr: impl Into<String>, value_type: SemType) -> Self {
        EmitResult {
            setup_lines: Vec::new(),
            value_expr: value_expr.into(),
            value_type,
        }
    }

    /// Value preceded by `setup_lines`
    pub fn with_setup(
        setup_lines: Vec<String>,
        value_expr: impl Into<String>,
        value_type: SemType,
    ) -> Self {
        EmitResult {
            setup_lines,
            value_expr: value_expr.into(),
            value_type,
        }
    }

    /// Whether the value needs no setup
    pub fn is_pure(&self) -> bool {
        self.setup_lines.is_empty()
    }
}

/// Per-emission state: fresh temporaries and codegen warnings
#[derive(Debug, Default)]
pub struct EmitContext {
    temps: usize,
    warnings: Vec<String>,
}

impl EmitContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh temporary name, unique within this emission
    pub fn temp(&mut self, prefix: &str) -> String {
        let name = format!("__{}{}", prefix, self.temps);
        self.temps += 1;
        name
    }

    /// Records a codegen warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "codegen fallback");
        self.warnings.push(message);
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consumes the context, returning its warnings
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

/// Lowers one family of `call` targets
pub trait CallTransformer {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Whether this transformer lowers `target` (with the given receiver)
    fn can_handle(&self, target: &str, receiver: Option<&IrExpr>) -> bool;

    /// Lowers the call; `call` is always an [`IrExprKind::Call`]
    fn handle(
        &self,
        registry: &TransformerRegistry,
        call: &IrExpr,
        ctx: &mut EmitContext,
    ) -> EmitResult;
}

/// Ordered call transformers plus the exhaustive expression and statement
/// dispatch
pub struct TransformerRegistry {
    calls: Vec<Box<dyn CallTransformer>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformerRegistry {
    /// Registry with the built-in transformers
    pub fn new() -> Self {
        TransformerRegistry {
            calls: vec![
                Box::new(wide_int::FactoryTransformer),
                Box::new(wide_int::ArithmeticTransformer),
                Box::new(value::GlobalTransformer),
                Box::new(value::AddressFactoryTransformer),
                Box::new(value::ValueMethodTransformer),
                Box::new(value::StructFactoryTransformer),
                Box::new(collection::ArrayTransformer),
                Box::new(call::EventTransformer),
                Box::new(call::InternalCallTransformer),
                Box::new(call::InterfaceCallTransformer),
            ],
        }
    }

    /// Lowers one expression
    pub fn expr(&self, expr: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let ty = expr.ty.clone();
        match &expr.kind {
            IrExprKind::Literal(lit) => literal::lower(lit, &ty, ctx),
            IrExprKind::Var { name, scope } => match scope {
                VarScope::Memory => EmitResult::value(name.clone(), ty),
                VarScope::Storage if ty.is_mapping() => {
                    self.fallback(expr, "whole mapping used as a value", ctx)
                }
                VarScope::Storage => EmitResult::value(format!("{}()", names::load(name)), ty),
            },
            IrExprKind::Call {
                target, receiver, ..
            } => match self
                .calls
                .iter()
                .find(|t| t.can_handle(target, receiver.as_deref()))
            {
                Some(transformer) => {
                    tracing::debug!(target = %target, transformer = transformer.name(), "lowering call");
                    transformer.handle(self, expr, ctx)
                }
                None => self.fallback(expr, &format!("call to `{}`", target), ctx),
            },
            IrExprKind::Member { object, field } => value::member(self, object, field, ty, ctx),
            IrExprKind::Binary { op, left, right } => self.logic(*op, left, right, ctx),
            IrExprKind::Unary {
                op: IrUnaryOp::Not,
                operand,
            } => {
                let inner = self.expr(operand, ctx);
                EmitResult::with_setup(inner.setup_lines, format!("!({})", inner.value_expr), ty)
            }
            IrExprKind::Condition { op, left, right } => {
                wide_int::comparison(self, *op, left, right, ctx)
            }
            IrExprKind::MapGet { name, key, .. } => {
                collection::map_get(self, name, &[key.as_ref()], ty, ctx)
            }
            IrExprKind::MapGet2 {
                name, key1, key2, ..
            } => collection::map_get(self, name, &[key1.as_ref(), key2.as_ref()], ty, ctx),
            IrExprKind::MapSet {
                name, key, value, ..
            } => collection::map_set(self, name, &[key.as_ref()], value, ctx),
            IrExprKind::MapSet2 {
                name,
                key1,
                key2,
                value,
                ..
            } => collection::map_set(self, name, &[key1.as_ref(), key2.as_ref()], value, ctx),
            IrExprKind::ArrayLiteral(items) => collection::array_literal(self, items, ty, ctx),
            IrExprKind::ArrayAssignment {
                array,
                index,
                value,
            } => collection::array_assign(self, array, index, value, ctx),
            // Interface values are addresses at runtime
            IrExprKind::InterfaceCast { address, .. } => {
                let inner = self.expr(address, ctx);
                EmitResult::with_setup(inner.setup_lines, inner.value_expr, ty)
            }
        }
    }

    /// Lowers a sequence of expressions, keeping their evaluation order
    ///
    /// When a later operand needs setup lines, earlier non-trivial values are
    /// hoisted into temporaries so they still run first.
    pub fn sequence(&self, exprs: &[&IrExpr], ctx: &mut EmitContext) -> (Vec<String>, Vec<String>) {
        let lowered: Vec<EmitResult> = exprs.iter().map(|e| self.expr(e, ctx)).collect();
        let last_setup = lowered.iter().rposition(|r| !r.is_pure());

        let mut setup = Vec::new();
        let mut values = Vec::with_capacity(lowered.len());
        for (i, result) in lowered.into_iter().enumerate() {
            setup.extend(result.setup_lines);
            let hoist = matches!(last_setup, Some(last) if i < last)
                && !is_trivial(&result.value_expr);
            if hoist {
                let temp = ctx.temp("v");
                setup.push(format!("const {} = {};", temp, result.value_expr));
                values.push(temp);
            } else {
                values.push(result.value_expr);
            }
        }
        (setup, values)
    }

    /// `&&` / `||` with short-circuit evaluation of the right operand's setup
    fn logic(&self, op: LogicOp, left: &IrExpr, right: &IrExpr, ctx: &mut EmitContext) -> EmitResult {
        let symbol = match op {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        };
        let l = self.expr(left, ctx);
        let r = self.expr(right, ctx);
        if r.is_pure() {
            return EmitResult::with_setup(
                l.setup_lines,
                format!("({} {} {})", l.value_expr, symbol, r.value_expr),
                SemType::Bool,
            );
        }

        let temp = ctx.temp("b");
        let mut setup = l.setup_lines;
        setup.push(format!("let {}: bool = {};", temp, l.value_expr));
        let guard = match op {
            LogicOp::And => temp.clone(),
            LogicOp::Or => format!("!{}", temp),
        };
        setup.push(format!("if ({}) {{", guard));
        setup.extend(r.setup_lines.into_iter().map(|l| format!("  {}", l)));
        setup.push(format!("  {} = {};", temp, r.value_expr));
        setup.push("}".to_string());
        EmitResult::with_setup(setup, temp, SemType::Bool)
    }

    /// Visible placeholder for anything without a lowering
    pub fn fallback(&self, expr: &IrExpr, what: &str, ctx: &mut EmitContext) -> EmitResult {
        ctx.warn(format!("no lowering for {}", what));
        EmitResult::value(
            format!("/* unsupported expression: {} */", what.replace("*/", "* /")),
            expr.ty.clone(),
        )
    }

    /// Lowers statements at `indent` levels
    pub fn block(&self, stmts: &[IrStmt], indent: usize, ctx: &mut EmitContext) -> Vec<String> {
        stmts
            .iter()
            .flat_map(|s| statement::lower(self, s, indent, ctx))
            .collect()
    }
}

/// Identifier, number or keyword literal; safe to evaluate late
fn is_trivial(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Target type spelled in declarations
pub fn type_name(ty: &SemType) -> String {
    match ty {
        SemType::Bool => "bool".to_string(),
        other => other.runtime_name(),
    }
}

/// Boxes storage-bound booleans
pub fn storage_value(value_expr: &str, ty: &SemType) -> String {
    match ty {
        SemType::Bool => format!("Boolean.create({})", value_expr),
        _ => value_expr.to_string(),
    }
}

/// Default value of a declaration without initializer
pub fn default_value(ty: &SemType) -> String {
    match ty {
        SemType::U256 => "U256.create()".to_string(),
        SemType::I256 => "I256.create()".to_string(),
        SemType::Address | SemType::Interface(_) => "Address.create()".to_string(),
        SemType::Str => "Str.create()".to_string(),
        SemType::Bool => "false".to_string(),
        SemType::StaticArray { element, length } => {
            format!("new Array<{}>({})", element.runtime_name(), length)
        }
        SemType::DynamicArray(element) => format!("new Array<{}>(0)", element.runtime_name()),
        SemType::Struct(name) => format!("{}()", names::struct_alloc(name)),
        SemType::Void | SemType::Mapping { .. } | SemType::MappingNested { .. } => "0".to_string(),
    }
}

/// Indents `line` by `level` two-space steps
pub(crate) fn indent(level: usize, line: &str) -> String {
    format!("{}{}", "  ".repeat(level), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::{CmpOp, Literal};

    fn storage(name: &str, ty: SemType) -> IrExpr {
        IrExpr::var(name, VarScope::Storage, ty)
    }

    #[test]
    fn test_storage_read_uses_accessor() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let out = registry.expr(&storage("count", SemType::U256), &mut ctx);
        assert_eq!(out.value_expr, "load_count()");
        assert!(out.is_pure());
    }

    #[test]
    fn test_unknown_call_falls_back_with_warning() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let call = IrExpr::call("Mystery.thing", None, vec![], SemType::U256);
        let out = registry.expr(&call, &mut ctx);
        assert!(out.value_expr.starts_with("/* unsupported expression"));
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_short_circuit_keeps_right_setup_guarded() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let text = IrExpr::new(
            IrExprKind::Literal(Literal::Str("ab".into())),
            SemType::Str,
        );
        let len = IrExpr::call("Str.length", Some(text), vec![], SemType::U256);
        let right = IrExpr::new(
            IrExprKind::Condition {
                op: CmpOp::Gt,
                left: Box::new(len),
                right: Box::new(IrExpr::int("1", SemType::U256)),
            },
            SemType::Bool,
        );
        let expr = IrExpr::new(
            IrExprKind::Binary {
                op: LogicOp::And,
                left: Box::new(IrExpr::var("ok", VarScope::Memory, SemType::Bool)),
                right: Box::new(right),
            },
            SemType::Bool,
        );
        let out = registry.expr(&expr, &mut ctx);
        let temp = out.value_expr.clone();
        assert!(temp.starts_with("__b"));
        assert_eq!(out.setup_lines[0], format!("let {}: bool = ok;", temp));
        assert_eq!(out.setup_lines[1], format!("if ({}) {{", temp));
        assert_eq!(out.setup_lines.last().unwrap(), "}");
    }

    #[test]
    fn test_sequence_hoists_calls_before_later_setup() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let first = storage("count", SemType::U256);
        let second = IrExpr::new(
            IrExprKind::Literal(Literal::Str("x".into())),
            SemType::Str,
        );
        let (setup, values) = registry.sequence(&[&first, &second], &mut ctx);
        assert!(values[0].starts_with("__v"));
        assert_eq!(setup[0], format!("const {} = load_count();", values[0]));
        assert!(values[1].starts_with("Str.fromBytes("));
    }
}
