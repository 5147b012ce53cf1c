//! Statements
//!
//! Each statement lowers to at most one IR statement. Assignments are
//! resolved on the shape of their target: locals, storage fields, struct
//! fields, mapping entries and array elements.

use super::{
    array, binary, build_expr, condition, errors, expression::this_field, loops, mapping,
    note_storage_write, structs, variable::VariableBuilder, check_value, IrBuilder,
};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{AssignTarget, IrExpr, IrExprKind, IrStmt, SemType, VarScope};
use crate::error::{Error, Result};
use crate::parser::{BinaryOp, Block, Expr, ExprKind, Stmt, StmtKind};

/// Builds one statement
pub struct StatementBuilder<'a> {
    stmt: &'a Stmt,
}

impl<'a> StatementBuilder<'a> {
    /// Wraps a statement
    pub fn new(stmt: &'a Stmt) -> Self {
        StatementBuilder { stmt }
    }
}

impl IrBuilder for StatementBuilder<'_> {
    type Output = Option<IrStmt>;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        if let StmtKind::If {
            then_branch,
            else_branch,
            ..
        } = &self.stmt.kind
        {
            let then_ok = matches!(then_branch.kind, StmtKind::Block(_));
            let else_ok = else_branch
                .as_ref()
                .map(|s| matches!(s.kind, StmtKind::Block(_) | StmtKind::If { .. }))
                .unwrap_or(true);
            if !then_ok || !else_ok {
                ctx.syntax_error(SyntaxCode::NonBlockIfBranch, self.stmt.line, &[]);
                return false;
            }
        }
        true
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<Option<IrStmt>> {
        let line = self.stmt.line;
        let built = match &self.stmt.kind {
            StmtKind::VarDecl {
                name,
                mutable,
                ty,
                init,
            } => VariableBuilder::new(name, *mutable, ty.as_ref(), init.as_ref(), line)
                .validate_and_build_ir(ctx)?,
            StmtKind::Expr(expr) => expression_statement(expr, ctx)?,
            StmtKind::Return(value) => return_statement(value.as_ref(), ctx, line)?,
            StmtKind::If {
                condition: cond,
                then_branch,
                else_branch,
            } => {
                let condition = condition::build_condition(cond, ctx)?;
                let then_branch = build_body(then_branch, ctx)?;
                let else_branch = match else_branch {
                    Some(stmt) => Some(build_body(stmt, ctx)?),
                    None => None,
                };
                IrStmt::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => loops::ForBuilder::new(
                init.as_deref(),
                condition.as_ref(),
                update.as_ref(),
                body,
            )
            .validate_and_build_ir(ctx)?,
            StmtKind::While { condition, body } => {
                loops::WhileBuilder::new(condition, body).validate_and_build_ir(ctx)?
            }
            StmtKind::DoWhile { body, condition } => {
                loops::DoWhileBuilder::new(body, condition).validate_and_build_ir(ctx)?
            }
            StmtKind::Block(block) => IrStmt::Block(build_block(block, ctx)?),
            StmtKind::Break => return Err(Error::unsupported("break", line)),
            StmtKind::Continue => return Err(Error::unsupported("continue", line)),
            StmtKind::Empty => return Ok(None),
        };
        Ok(Some(built))
    }
}

/// Builds a block in a fresh scope
pub fn build_block(block: &Block, ctx: &mut CompilationContext) -> Result<Vec<IrStmt>> {
    ctx.symbols.enter_scope();
    let result = build_stmts(&block.stmts, ctx);
    ctx.symbols.exit_scope()?;
    result
}

fn build_stmts(stmts: &[Stmt], ctx: &mut CompilationContext) -> Result<Vec<IrStmt>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        if let Some(ir) = StatementBuilder::new(stmt).validate_and_build_ir(ctx)? {
            out.push(ir);
        }
    }
    Ok(out)
}

/// Builds a branch or loop body; a single statement gets its own scope too
pub fn build_body(stmt: &Stmt, ctx: &mut CompilationContext) -> Result<Vec<IrStmt>> {
    match &stmt.kind {
        StmtKind::Block(block) => build_block(block, ctx),
        _ => {
            ctx.symbols.enter_scope();
            let result = build_stmts(std::slice::from_ref(stmt), ctx);
            ctx.symbols.exit_scope()?;
            result
        }
    }
}

fn return_statement(value: Option<&Expr>, ctx: &mut CompilationContext, line: usize) -> Result<IrStmt> {
    let mut built = match value {
        Some(expr) => Some(build_expr(expr, ctx)?),
        None => None,
    };
    let declared = ctx.method.as_ref().and_then(|m| m.return_type.clone());
    if let (Some(value), Some(ty)) = (built.as_mut(), declared.as_ref()) {
        super::coerce_literal(value, ty);
    }
    let returned = built.as_ref().map(|v| v.ty.clone());
    let matches = match (&declared, &returned) {
        (None, None) => true,
        (Some(d), Some(r)) => super::types::assignable(d, r),
        _ => false,
    };
    if !matches {
        let show = |t: &Option<SemType>| {
            t.as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "void".into())
        };
        let method = ctx.current_method_name();
        ctx.semantic_error(
            SemanticCode::InvalidReturnType,
            line,
            &[method, show(&returned), show(&declared)],
        );
    }
    Ok(IrStmt::Return(built))
}

/// Error name if `expr` is `SomeError.revert(...)`
fn revert_target<'e>(expr: &'e Expr, ctx: &CompilationContext) -> Option<(&'e str, &'e str, &'e [Expr])> {
    if let ExprKind::Call { callee, args, .. } = &expr.kind {
        if let ExprKind::Member { object, property } = &callee.kind {
            let name = object.as_identifier()?;
            if ctx.symbols.lookup_variable(name).is_none() && ctx.error_decl(name).is_some() {
                return Some((name, property.as_str(), args.as_slice()));
            }
        }
    }
    None
}

pub(crate) fn expression_statement(expr: &Expr, ctx: &mut CompilationContext) -> Result<IrStmt> {
    if let Some((error, method, args)) = revert_target(expr, ctx) {
        return errors::revert(error, method, args, ctx, expr.line);
    }
    match &expr.kind {
        ExprKind::Assign { op, target, value } => assignment(*op, target, value, ctx, expr.line),
        _ => Ok(IrStmt::Expr(build_expr(expr, ctx)?)),
    }
}

/// Right-hand side of an assignment; compound forms read the target first
fn assigned_value(
    op: Option<BinaryOp>,
    value: &Expr,
    current: impl FnOnce(&mut CompilationContext) -> Result<IrExpr>,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    match op {
        Some(op) => {
            let current = current(ctx)?;
            let rhs = build_expr(value, ctx)?;
            binary::combine(op, current, rhs, ctx, line)
        }
        None => build_expr(value, ctx),
    }
}

/// Lowers `target (op)= value`
fn assignment(
    op: Option<BinaryOp>,
    target: &Expr,
    value: &Expr,
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrStmt> {
    match &target.kind {
        ExprKind::Identifier(name) => {
            let info = match ctx.symbols.lookup_variable(name) {
                Some(info) if info.scope == VarScope::Memory => info.clone(),
                _ => {
                    return Err(Error::UndefinedSymbol {
                        name: name.clone(),
                        line,
                    })
                }
            };
            if !info.mutable {
                return Err(Error::unsupported(
                    format!("assignment to const `{}`", name),
                    line,
                ));
            }
            let current = IrExpr::var(name.clone(), VarScope::Memory, info.ty.clone());
            let mut value = assigned_value(op, value, |_| Ok(current), ctx, line)?;
            check_value(ctx, name, &info.ty, &mut value, line);
            Ok(IrStmt::Assign {
                target: AssignTarget::Var {
                    name: name.clone(),
                    scope: VarScope::Memory,
                    ty: info.ty,
                },
                value,
            })
        }

        ExprKind::Member { object, property } if matches!(object.kind, ExprKind::This) => {
            let info = ctx
                .symbols
                .lookup_storage(property)
                .cloned()
                .ok_or_else(|| Error::UndefinedSymbol {
                    name: format!("this.{}", property),
                    line,
                })?;
            if info.ty.is_mapping() || info.ty.array_element().is_some() {
                return Err(Error::unsupported(
                    format!("assigning the whole of `{}`", property),
                    line,
                ));
            }
            let current = IrExpr::var(property.clone(), VarScope::Storage, info.ty.clone());
            let mut value = assigned_value(op, value, |_| Ok(current), ctx, line)?;
            check_value(ctx, property, &info.ty, &mut value, line);
            note_storage_write(ctx, property, line);
            Ok(IrStmt::Assign {
                target: AssignTarget::Var {
                    name: property.clone(),
                    scope: VarScope::Storage,
                    ty: info.ty,
                },
                value,
            })
        }

        ExprKind::Member { object, property } => {
            let base = build_expr(object, ctx)?;
            let storage_label = match &base.kind {
                IrExprKind::Var {
                    name,
                    scope: VarScope::Storage,
                } => Some(format!("{}.{}", name, property)),
                _ => None,
            };
            let target = structs::field_target(base.clone(), property, ctx, line)?;
            let mut value = assigned_value(
                op,
                value,
                |ctx| structs::field_read(base, property, ctx, line),
                ctx,
                line,
            )?;
            check_value(ctx, property, target.ty(), &mut value, line);
            if let Some(label) = storage_label {
                note_storage_write(ctx, &label, line);
            }
            Ok(IrStmt::Assign { target, value })
        }

        ExprKind::Index { object, index } => {
            // this.nested[a][b] = v
            if let ExprKind::Index {
                object: inner,
                index: outer,
            } = &object.kind
            {
                if let Some(info) = this_field(inner, ctx) {
                    if matches!(info.ty, SemType::MappingNested { .. }) {
                        let keys = mapping::build_keys(&info, &[outer, index], ctx, line)?;
                        let current_keys = keys.clone();
                        let value = assigned_value(
                            op,
                            value,
                            |ctx| Ok(mapping::read(&info, current_keys, ctx, line)),
                            ctx,
                            line,
                        )?;
                        return Ok(IrStmt::Expr(mapping::write(&info, keys, value, ctx, line)));
                    }
                }
            }
            if let Some(info) = this_field(object, ctx) {
                if let SemType::Mapping { .. } = info.ty {
                    let keys = mapping::build_keys(&info, &[index], ctx, line)?;
                    let current_keys = keys.clone();
                    let value = assigned_value(
                        op,
                        value,
                        |ctx| Ok(mapping::read(&info, current_keys, ctx, line)),
                        ctx,
                        line,
                    )?;
                    return Ok(IrStmt::Expr(mapping::write(&info, keys, value, ctx, line)));
                }
            }
            let array_value = build_expr(object, ctx)?;
            let idx = build_expr(index, ctx)?;
            let (current_array, current_idx) = (array_value.clone(), idx.clone());
            let value = assigned_value(
                op,
                value,
                |ctx| array::get(current_array, current_idx, ctx, line),
                ctx,
                line,
            )?;
            Ok(IrStmt::Expr(array::assign(array_value, idx, value, ctx, line)?))
        }

        _ => Err(Error::unsupported(
            format!("assignment to {}", target.kind_name()),
            line,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::context::MethodFrame;
    use crate::compiler::ir::{StateMutability, Visibility};
    use crate::compiler::symbols::VariableInfo;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn body(source: &str) -> Block {
        let wrapped = format!("@Contract class C {{ m() {{ {} }} }}", source);
        let tokens = Scanner::new(&wrapped).scan_tokens().unwrap();
        let file = Parser::new(tokens).parse().unwrap();
        let class = file.classes().next().unwrap().clone();
        let method = class.methods().next().unwrap().clone();
        method.body.unwrap()
    }

    fn ctx(mutability: StateMutability) -> CompilationContext {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        ctx.symbols
            .declare_variable("count", VariableInfo::storage("count", SemType::U256));
        ctx.symbols.declare_variable(
            "balances",
            VariableInfo::storage(
                "balances",
                SemType::Mapping {
                    key: Box::new(SemType::Address),
                    value: Box::new(SemType::U256),
                },
            ),
        );
        ctx.method = Some(MethodFrame {
            name: "m".into(),
            mutability,
            visibility: Visibility::Public,
            return_type: None,
        });
        ctx
    }

    #[test]
    fn test_counter_increment() {
        let mut c = ctx(StateMutability::Nonpayable);
        let stmts = build_block(&body("this.count = this.count.add(U256Factory.fromString(\"1\"));"), &mut c)
            .unwrap();
        match &stmts[0] {
            IrStmt::Assign { target, value } => {
                assert!(target.is_storage());
                assert_eq!(value.call_target(), Some("U256.add"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!c.diagnostics.has_errors());
    }

    #[test]
    fn test_compound_mapping_write() {
        let mut c = ctx(StateMutability::Nonpayable);
        let stmts = build_block(&body("this.balances[msg.sender] += U256Factory.create();"), &mut c)
            .unwrap();
        match &stmts[0] {
            IrStmt::Expr(e) => match &e.kind {
                IrExprKind::MapSet { value, .. } => {
                    assert_eq!(value.call_target(), Some("U256.add"))
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_in_view_reported() {
        let mut c = ctx(StateMutability::View);
        build_block(&body("this.count = U256Factory.create();"), &mut c).unwrap();
        assert_eq!(c.diagnostics.semantic_errors()[0].code, "E014");
    }

    #[test]
    fn test_non_block_if_branch() {
        let mut c = ctx(StateMutability::Nonpayable);
        build_block(&body("if (true) this.count = U256Factory.create();"), &mut c).unwrap();
        assert_eq!(c.diagnostics.syntax_errors()[0].code, "S006");
    }

    #[test]
    fn test_non_boolean_if_condition() {
        let mut c = ctx(StateMutability::Nonpayable);
        build_block(&body("if (this.count) { }"), &mut c).unwrap();
        assert_eq!(c.diagnostics.semantic_errors()[0].code, "E013");
    }

    #[test]
    fn test_break_is_unsupported() {
        let mut c = ctx(StateMutability::Nonpayable);
        let err = build_block(&body("while (true) { break; }"), &mut c).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_assign_to_const() {
        let mut c = ctx(StateMutability::Nonpayable);
        let err = build_block(&body("const x = U256Factory.create(); x = x;"), &mut c).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct { .. }));
    }
}
