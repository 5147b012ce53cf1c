//! Statement lowering

use super::{
    default_value, indent, names, storage_value, type_name, EmitContext, EmitResult,
    TransformerRegistry,
};
use crate::compiler::ir::{AssignTarget, IrExpr, IrExprKind, IrStmt, SemType, VarScope};

pub(super) fn lower(
    registry: &TransformerRegistry,
    stmt: &IrStmt,
    level: usize,
    ctx: &mut EmitContext,
) -> Vec<String> {
    let mut out = Vec::new();
    match stmt {
        IrStmt::Let { name, ty, init } => {
            let value = match init {
                Some(init) => {
                    let v = registry.expr(init, ctx);
                    push_setup(&mut out, level, v.setup_lines);
                    v.value_expr
                }
                None => default_value(ty),
            };
            out.push(indent(
                level,
                &format!("let {}: {} = {};", name, type_name(ty), value),
            ));
        }
        IrStmt::Assign { target, value } => assign(registry, target, value, level, ctx, &mut out),
        IrStmt::Expr(expr) => {
            let v = registry.expr(expr, ctx);
            push_setup(&mut out, level, v.setup_lines);
            if !v.value_expr.is_empty() {
                out.push(indent(level, &format!("{};", v.value_expr)));
            }
        }
        IrStmt::Return(None) => out.push(indent(level, "return;")),
        IrStmt::Return(Some(expr)) => {
            let v = registry.expr(expr, ctx);
            push_setup(&mut out, level, v.setup_lines);
            out.push(indent(level, &format!("return {};", v.value_expr)));
        }
        IrStmt::Revert { error, args } => {
            let refs: Vec<&IrExpr> = args.iter().collect();
            let (setup, values) = registry.sequence(&refs, ctx);
            push_setup(&mut out, level, setup);
            out.push(indent(
                level,
                &format!("{}({});", names::revert_error(error), values.join(", ")),
            ));
        }
        IrStmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let c = registry.expr(condition, ctx);
            push_setup(&mut out, level, c.setup_lines);
            out.push(indent(level, &format!("if ({}) {{", c.value_expr)));
            out.extend(registry.block(then_branch, level + 1, ctx));
            if let Some(else_branch) = else_branch {
                out.push(indent(level, "} else {"));
                out.extend(registry.block(else_branch, level + 1, ctx));
            }
            out.push(indent(level, "}"));
        }
        IrStmt::While { condition, body } => {
            let c = registry.expr(condition, ctx);
            out.extend(guarded_loop(registry, c, body, None, level, ctx));
        }
        IrStmt::For {
            init,
            condition,
            update,
            body,
        } => {
            // Scoped so the loop variable does not leak
            out.push(indent(level, "{"));
            if let Some(init) = init {
                out.extend(lower(registry, init, level + 1, ctx));
            }
            let c = match condition {
                Some(condition) => registry.expr(condition, ctx),
                None => EmitResult::value("true", SemType::Bool),
            };
            out.extend(guarded_loop(
                registry,
                c,
                body,
                update.as_deref(),
                level + 1,
                ctx,
            ));
            out.push(indent(level, "}"));
        }
        IrStmt::DoWhile { body, condition } => {
            let c = registry.expr(condition, ctx);
            if c.is_pure() {
                out.push(indent(level, "do {"));
                out.extend(registry.block(body, level + 1, ctx));
                out.push(indent(level, &format!("}} while ({});", c.value_expr)));
            } else {
                out.push(indent(level, "while (true) {"));
                out.extend(registry.block(body, level + 1, ctx));
                push_setup(&mut out, level + 1, c.setup_lines);
                out.push(indent(level + 1, &format!("if (!({})) break;", c.value_expr)));
                out.push(indent(level, "}"));
            }
        }
        IrStmt::Block(stmts) => {
            out.push(indent(level, "{"));
            out.extend(registry.block(stmts, level + 1, ctx));
            out.push(indent(level, "}"));
        }
    }
    out
}

/// `while` whose condition may need setup lines on every iteration
fn guarded_loop(
    registry: &TransformerRegistry,
    condition: EmitResult,
    body: &[IrStmt],
    update: Option<&IrStmt>,
    level: usize,
    ctx: &mut EmitContext,
) -> Vec<String> {
    let mut out = Vec::new();
    if condition.is_pure() {
        out.push(indent(level, &format!("while ({}) {{", condition.value_expr)));
    } else {
        out.push(indent(level, "while (true) {"));
        push_setup(&mut out, level + 1, condition.setup_lines);
        out.push(indent(
            level + 1,
            &format!("if (!({})) break;", condition.value_expr),
        ));
    }
    out.extend(registry.block(body, level + 1, ctx));
    if let Some(update) = update {
        out.extend(lower(registry, update, level + 1, ctx));
    }
    out.push(indent(level, "}"));
    out
}

fn assign(
    registry: &TransformerRegistry,
    target: &AssignTarget,
    value: &IrExpr,
    level: usize,
    ctx: &mut EmitContext,
    out: &mut Vec<String>,
) {
    match target {
        AssignTarget::Var {
            name,
            scope: VarScope::Memory,
            ..
        } => {
            let v = registry.expr(value, ctx);
            push_setup(out, level, v.setup_lines);
            out.push(indent(level, &format!("{} = {};", name, v.value_expr)));
        }
        AssignTarget::Var { name, ty, .. } => {
            let v = registry.expr(value, ctx);
            push_setup(out, level, v.setup_lines);
            out.push(indent(
                level,
                &format!("{}({});", names::store(name), storage_value(&v.value_expr, ty)),
            ));
        }
        AssignTarget::Field { base, field, ty } => {
            if let IrExprKind::Var {
                name,
                scope: VarScope::Storage,
            } = &base.kind
            {
                let v = registry.expr(value, ctx);
                push_setup(out, level, v.setup_lines);
                out.push(indent(
                    level,
                    &format!(
                        "{}({});",
                        names::store_field(name, field),
                        storage_value(&v.value_expr, ty)
                    ),
                ));
                return;
            }
            let SemType::Struct(struct_name) = &base.ty else {
                let placeholder = registry.fallback(base, &format!("field `{}` assignment", field), ctx);
                out.push(indent(level, &format!("{};", placeholder.value_expr)));
                return;
            };
            let (setup, values) = registry.sequence(&[base, value], ctx);
            push_setup(out, level, setup);
            out.push(indent(
                level,
                &format!(
                    "{}({}, {});",
                    names::struct_set(struct_name, field),
                    values[0],
                    values[1]
                ),
            ));
        }
    }
}

fn push_setup(out: &mut Vec<String>, level: usize, setup: Vec<String>) {
    out.extend(setup.iter().map(|line| indent(level, line)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::CmpOp;

    fn count() -> IrExpr {
        IrExpr::var("count", VarScope::Storage, SemType::U256)
    }

    #[test]
    fn test_counter_increment() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let stmt = IrStmt::Assign {
            target: AssignTarget::Var {
                name: "count".into(),
                scope: VarScope::Storage,
                ty: SemType::U256,
            },
            value: IrExpr::call(
                "U256.add",
                Some(count()),
                vec![IrExpr::int("1", SemType::U256)],
                SemType::U256,
            ),
        };
        assert_eq!(
            lower(&registry, &stmt, 1, &mut ctx),
            vec!["  store_count(U256.add(load_count(), U256.fromU64(1)));".to_string()]
        );
    }

    #[test]
    fn test_bool_storage_write_is_boxed() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let stmt = IrStmt::Assign {
            target: AssignTarget::Var {
                name: "paused".into(),
                scope: VarScope::Storage,
                ty: SemType::Bool,
            },
            value: IrExpr::boolean(true),
        };
        assert_eq!(
            lower(&registry, &stmt, 0, &mut ctx),
            vec!["store_paused(Boolean.create(true));".to_string()]
        );
    }

    #[test]
    fn test_while_with_setup_in_condition() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let cond = IrExpr::new(
            IrExprKind::Condition {
                op: CmpOp::Lt,
                left: Box::new(IrExpr::var("i", VarScope::Memory, SemType::U256)),
                right: Box::new(IrExpr::int(
                    "340282366920938463463374607431768211456",
                    SemType::U256,
                )),
            },
            SemType::Bool,
        );
        let stmt = IrStmt::While {
            condition: cond,
            body: vec![IrStmt::Return(None)],
        };
        let lines = lower(&registry, &stmt, 0, &mut ctx);
        assert_eq!(lines[0], "while (true) {");
        assert!(lines.iter().any(|l| l.trim().starts_with("if (!(U256.lessThan(i, ")));
        assert_eq!(lines.last().unwrap(), "}");
    }

    #[test]
    fn test_revert_statement() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let stmt = IrStmt::Revert {
            error: "Insufficient".into(),
            args: vec![IrExpr::call("Msg.sender", None, vec![], SemType::Address)],
        };
        assert_eq!(
            lower(&registry, &stmt, 0, &mut ctx),
            vec!["__revert_Insufficient(Msg.sender());".to_string()]
        );
    }

    #[test]
    fn test_let_without_initializer_uses_default() {
        let registry = TransformerRegistry::new();
        let mut ctx = EmitContext::new();
        let stmt = IrStmt::Let {
            name: "total".into(),
            ty: SemType::U256,
            init: None,
        };
        assert_eq!(
            lower(&registry, &stmt, 0, &mut ctx),
            vec!["let total: U256 = U256.create();".to_string()]
        );
    }
}
