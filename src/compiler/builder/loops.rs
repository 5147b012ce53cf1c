//! `for`, `while` and `do ... while`

use super::{condition, statement, IrBuilder, StatementBuilder};
use crate::compiler::context::CompilationContext;
use crate::compiler::ir::IrStmt;
use crate::error::Result;
use crate::parser::{Expr, Stmt};

/// Builds `for (init; condition; update) body`
pub struct ForBuilder<'a> {
    init: Option<&'a Stmt>,
    condition: Option<&'a Expr>,
    update: Option<&'a Expr>,
    body: &'a Stmt,
}

impl<'a> ForBuilder<'a> {
    /// Wraps the parts of one `for` loop
    pub fn new(
        init: Option<&'a Stmt>,
        condition: Option<&'a Expr>,
        update: Option<&'a Expr>,
        body: &'a Stmt,
    ) -> Self {
        ForBuilder {
            init,
            condition,
            update,
            body,
        }
    }

    fn build_parts(&self, ctx: &mut CompilationContext) -> Result<IrStmt> {
        let init = match self.init {
            Some(stmt) => StatementBuilder::new(stmt)
                .validate_and_build_ir(ctx)?
                .map(Box::new),
            None => None,
        };
        let condition = match self.condition {
            Some(expr) => Some(condition::build_condition(expr, ctx)?),
            None => None,
        };
        let update = match self.update {
            Some(expr) => Some(Box::new(statement::expression_statement(expr, ctx)?)),
            None => None,
        };
        let body = statement::build_body(self.body, ctx)?;
        Ok(IrStmt::For {
            init,
            condition,
            update,
            body,
        })
    }
}

impl IrBuilder for ForBuilder<'_> {
    type Output = IrStmt;

    fn validate(&mut self, _ctx: &mut CompilationContext) -> bool {
        true
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrStmt> {
        // The loop variable is scoped to the loop
        ctx.symbols.enter_scope();
        let result = self.build_parts(ctx);
        ctx.symbols.exit_scope()?;
        result
    }
}

/// Builds `while (condition) body`
pub struct WhileBuilder<'a> {
    condition: &'a Expr,
    body: &'a Stmt,
}

impl<'a> WhileBuilder<'a> {
    /// Wraps one `while` loop
    pub fn new(condition: &'a Expr, body: &'a Stmt) -> Self {
        WhileBuilder { condition, body }
    }
}

impl IrBuilder for WhileBuilder<'_> {
    type Output = IrStmt;

    fn validate(&mut self, _ctx: &mut CompilationContext) -> bool {
        true
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrStmt> {
        let condition = condition::build_condition(self.condition, ctx)?;
        let body = statement::build_body(self.body, ctx)?;
        Ok(IrStmt::While { condition, body })
    }
}

/// Builds `do body while (condition)`
pub struct DoWhileBuilder<'a> {
    body: &'a Stmt,
    condition: &'a Expr,
}

impl<'a> DoWhileBuilder<'a> {
    /// Wraps one `do ... while` loop
    pub fn new(body: &'a Stmt, condition: &'a Expr) -> Self {
        DoWhileBuilder { body, condition }
    }
}

impl IrBuilder for DoWhileBuilder<'_> {
    type Output = IrStmt;

    fn validate(&mut self, _ctx: &mut CompilationContext) -> bool {
        true
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrStmt> {
        let body = statement::build_body(self.body, ctx)?;
        let condition = condition::build_condition(self.condition, ctx)?;
        Ok(IrStmt::DoWhile { body, condition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::builder::build_block;
    use crate::lexer::Scanner;
    use crate::parser::{Block, Parser};

    fn body(source: &str) -> Block {
        let wrapped = format!("@Contract class C {{ m() {{ {} }} }}", source);
        let tokens = Scanner::new(&wrapped).scan_tokens().unwrap();
        let file = Parser::new(tokens).parse().unwrap();
        let class = file.classes().next().unwrap().clone();
        let method = class.methods().next().unwrap().clone();
        method.body.unwrap()
    }

    #[test]
    fn test_for_loop_scopes_its_variable() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let block = body(
            "for (let i = U256Factory.create(); i.lessThan(U256Factory.fromString(\"3\")); i = i.add(U256Factory.fromString(\"1\"))) { }",
        );
        let stmts = build_block(&block, &mut ctx).unwrap();
        match &stmts[0] {
            IrStmt::For {
                init,
                condition,
                update,
                ..
            } => {
                assert!(matches!(init.as_deref(), Some(IrStmt::Let { .. })));
                assert!(condition.is_some());
                assert!(matches!(update.as_deref(), Some(IrStmt::Assign { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.symbols.lookup_variable("i").is_none());
        assert!(!ctx.diagnostics.has_errors());
    }

    #[test]
    fn test_do_while() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let stmts = build_block(&body("do { } while (false);"), &mut ctx).unwrap();
        assert!(matches!(stmts[0], IrStmt::DoWhile { .. }));
    }
}
