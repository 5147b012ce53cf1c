use super::ast::{
    BinaryOp, Block, ClassDecl, ClassMember, ConstDecl, ConstructorDecl, Declaration, Decorator,
    Expr, ExprKind, ImportDecl, MethodDecl, Param, PropertyDecl, SourceFile, Stmt, StmtKind,
    TypeRef, UnaryOp,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Access modifiers accepted and ignored in class bodies
const IGNORED_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly"];

/// Recursive-descent parser for contract sources
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    path: String,
}

impl Parser {
    /// Creates a new parser over a token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            path: "<source>".to_string(),
        }
    }

    /// Sets the path label recorded on the resulting [`SourceFile`]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Parses the tokens into a source file
    pub fn parse(&mut self) -> Result<SourceFile> {
        let mut imports = Vec::new();
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            if self.check(&TokenKind::Import) {
                imports.push(self.parse_import()?);
                continue;
            }

            let decorators = self.parse_decorators()?;
            let exported = self.match_kind(&TokenKind::Export);
            if exported {
                self.match_kind(&TokenKind::Default);
            }

            match self.peek().kind {
                TokenKind::Class => {
                    let class = self.parse_class(decorators, exported)?;
                    declarations.push(Declaration::Class(class));
                }
                TokenKind::Const | TokenKind::Let if decorators.is_empty() => {
                    let decl = self.parse_const_decl(exported)?;
                    declarations.push(Declaration::Const(decl));
                }
                _ => {
                    return Err(self.expected_error(
                        "a class or const declaration",
                        Some("Top-level code must be an import, a class or a const binding."),
                    ))
                }
            }
        }

        Ok(SourceFile {
            path: self.path.clone(),
            imports,
            declarations,
        })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_import(&mut self) -> Result<ImportDecl> {
        let line = self.consume(TokenKind::Import)?.line;
        self.consume(TokenKind::LeftBrace)?;
        let mut names = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            names.push(self.expect_name()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace)?;
        self.consume(TokenKind::From)?;
        let from = match self.advance().kind {
            TokenKind::String(s) => s,
            _ => return Err(self.previous_error("module path string after `from`")),
        };
        self.match_kind(&TokenKind::Semicolon);
        Ok(ImportDecl { names, from, line })
    }

    fn parse_decorators(&mut self) -> Result<Vec<Decorator>> {
        let mut decorators = Vec::new();
        while self.check(&TokenKind::At) {
            let line = self.advance().line;
            let name = self.expect_name()?;
            let mut args = Vec::new();
            if self.match_kind(&TokenKind::LeftParen) {
                args = self.parse_arguments()?;
            }
            decorators.push(Decorator { name, args, line });
        }
        Ok(decorators)
    }

    fn parse_class(&mut self, decorators: Vec<Decorator>, exported: bool) -> Result<ClassDecl> {
        let line = self.consume(TokenKind::Class)?.line;
        let name = match &self.peek().kind {
            TokenKind::Identifier(n) => {
                let n = n.clone();
                self.advance();
                Some(n)
            }
            _ => None,
        };

        let mut heritage = Vec::new();
        if self.match_kind(&TokenKind::Extends) {
            loop {
                heritage.push(self.expect_name()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.match_kind(&TokenKind::Implements) {
            loop {
                self.expect_name()?;
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_member()?);
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(ClassDecl {
            name,
            decorators,
            heritage,
            members,
            exported,
            line,
        })
    }

    fn parse_member(&mut self) -> Result<ClassMember> {
        let decorators = self.parse_decorators()?;
        let is_static = self.match_kind(&TokenKind::Static);
        self.skip_modifiers();

        if self.check(&TokenKind::Constructor) {
            let line = self.advance().line;
            self.consume(TokenKind::LeftParen)?;
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            return Ok(ClassMember::Constructor(ConstructorDecl {
                decorators,
                params,
                body,
                line,
            }));
        }

        let line = self.peek().line;
        let name = self.expect_name()?;

        if self.match_kind(&TokenKind::LeftParen) {
            let params = self.parse_params()?;
            let return_type = if self.match_kind(&TokenKind::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let body = if self.check(&TokenKind::LeftBrace) {
                Some(self.parse_block()?)
            } else {
                self.match_kind(&TokenKind::Semicolon);
                None
            };
            return Ok(ClassMember::Method(MethodDecl {
                name,
                decorators,
                params,
                return_type,
                body,
                is_static,
                line,
            }));
        }

        self.match_kind(&TokenKind::Question);
        let ty = if self.match_kind(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.match_kind(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.match_kind(&TokenKind::Semicolon);

        Ok(ClassMember::Property(PropertyDecl {
            name,
            decorators,
            ty,
            initializer,
            is_static,
            line,
        }))
    }

    fn skip_modifiers(&mut self) {
        while let TokenKind::Identifier(name) = &self.peek().kind {
            let is_modifier = IGNORED_MODIFIERS.contains(&name.as_str());
            let followed_by_name = matches!(
                self.peek_at(1).kind,
                TokenKind::Identifier(_) | TokenKind::Constructor
            );
            if is_modifier && followed_by_name {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            let line = self.peek().line;
            let name = self.expect_name()?;
            self.match_kind(&TokenKind::Question);
            let ty = if self.match_kind(&TokenKind::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param { name, ty, line });
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;
        Ok(params)
    }

    fn parse_const_decl(&mut self, exported: bool) -> Result<ConstDecl> {
        let line = self.advance().line; // const / let
        let name = self.expect_name()?;
        let ty = if self.match_kind(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.consume(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.match_kind(&TokenKind::Semicolon);
        Ok(ConstDecl {
            name,
            ty,
            value,
            exported,
            line,
        })
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeRef> {
        let mut ty = match self.peek().kind.clone() {
            TokenKind::LeftBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RightBracket) {
                    items.push(self.parse_type()?);
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RightBracket)?;
                TypeRef::Tuple(items)
            }
            TokenKind::Number(text) => {
                self.advance();
                let n = text
                    .parse::<u64>()
                    .map_err(|_| self.previous_error("array length literal"))?;
                TypeRef::Literal(n)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                let mut args = Vec::new();
                if self.match_kind(&TokenKind::Lt) {
                    while !self.check(&TokenKind::Gt) {
                        args.push(self.parse_type()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.consume(TokenKind::Gt)?;
                }
                TypeRef::Named { name, args }
            }
            _ => return Err(self.expected_error("a type", None)),
        };

        while self.check(&TokenKind::LeftBracket)
            && matches!(self.peek_at(1).kind, TokenKind::RightBracket)
        {
            self.advance();
            self.advance();
            ty = TypeRef::Array(Box::new(ty));
        }
        Ok(ty)
    }

    /// Speculatively parses `<T, ...>(`; restores the position on failure
    fn try_parse_type_args(&mut self) -> Option<Vec<TypeRef>> {
        let saved = self.current;
        if !self.match_kind(&TokenKind::Lt) {
            return None;
        }
        let mut args = Vec::new();
        loop {
            match self.parse_type() {
                Ok(t) => args.push(t),
                Err(_) => {
                    self.current = saved;
                    return None;
                }
            }
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        if self.match_kind(&TokenKind::Gt) && self.check(&TokenKind::LeftParen) {
            Some(args)
        } else {
            self.current = saved;
            None
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Result<Block> {
        let line = self.consume(TokenKind::LeftBrace)?.line;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(Block { stmts, line })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let line = self.peek().line;
        let kind = match self.peek().kind {
            TokenKind::LeftBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Let | TokenKind::Const => {
                let kind = self.parse_var_decl()?;
                self.match_kind(&TokenKind::Semicolon);
                kind
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::While => {
                self.advance();
                self.consume(TokenKind::LeftParen)?;
                let condition = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { condition, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.consume(TokenKind::While)?;
                self.consume(TokenKind::LeftParen)?;
                let condition = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                self.match_kind(&TokenKind::Semicolon);
                StmtKind::DoWhile { body, condition }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon)
                    || self.check(&TokenKind::RightBrace)
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.match_kind(&TokenKind::Semicolon);
                StmtKind::Return(value)
            }
            TokenKind::Break => {
                self.advance();
                self.match_kind(&TokenKind::Semicolon);
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.match_kind(&TokenKind::Semicolon);
                StmtKind::Continue
            }
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            _ => {
                let expr = self.parse_expression()?;
                self.match_kind(&TokenKind::Semicolon);
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt { kind, line })
    }

    fn parse_var_decl(&mut self) -> Result<StmtKind> {
        let mutable = matches!(self.advance().kind, TokenKind::Let);
        let name = self.expect_name()?;
        let ty = if self.match_kind(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let init = if self.match_kind(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(StmtKind::VarDecl {
            name,
            mutable,
            ty,
            init,
        })
    }

    fn parse_if(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_for(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LeftParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            let line = self.peek().line;
            let kind = if matches!(self.peek().kind, TokenKind::Let | TokenKind::Const) {
                self.parse_var_decl()?
            } else {
                StmtKind::Expr(self.parse_expression()?)
            };
            Some(Box::new(Stmt { kind, line }))
        };
        self.consume(TokenKind::Semicolon)?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Parse an expression (assignment is the lowest precedence level)
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let target = self.parse_conditional()?;
        let op = match self.peek().kind {
            TokenKind::Assign => None,
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_expression()?;
        let line = target.line;
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            line,
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let condition = self.parse_binary(0)?;
        if !self.match_kind(&TokenKind::Question) {
            return Ok(condition);
        }
        let then_expr = self.parse_expression()?;
        self.consume(TokenKind::Colon)?;
        let else_expr = self.parse_expression()?;
        let line = condition.line;
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            line,
        ))
    }

    /// Precedence climbing over the binary operator table
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((op, prec)) = Self::binary_op(&self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let line = left.line;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
        let entry = match kind {
            TokenKind::OrOr => (BinaryOp::Or, 1),
            TokenKind::AndAnd => (BinaryOp::And, 2),
            TokenKind::Eq => (BinaryOp::Eq, 3),
            TokenKind::NotEq => (BinaryOp::NotEq, 3),
            TokenKind::Lt => (BinaryOp::Lt, 4),
            TokenKind::Gt => (BinaryOp::Gt, 4),
            TokenKind::LtEq => (BinaryOp::LtEq, 4),
            TokenKind::GtEq => (BinaryOp::GtEq, 4),
            TokenKind::Plus => (BinaryOp::Add, 5),
            TokenKind::Minus => (BinaryOp::Sub, 5),
            TokenKind::Star => (BinaryOp::Mul, 6),
            TokenKind::Slash => (BinaryOp::Div, 6),
            TokenKind::Percent => (BinaryOp::Mod, 6),
            _ => return None,
        };
        Some(entry)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        let line = self.advance().line;
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let line = self.peek().line;
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_name()?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        line,
                    );
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            type_args: Vec::new(),
                            args,
                        },
                        line,
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket)?;
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        line,
                    );
                }
                TokenKind::Lt => match self.try_parse_type_args() {
                    Some(type_args) => {
                        self.consume(TokenKind::LeftParen)?;
                        let args = self.parse_arguments()?;
                        expr = Expr::new(
                            ExprKind::Call {
                                callee: Box::new(expr),
                                type_args,
                                args,
                            },
                            line,
                        );
                    }
                    None => break,
                },
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parses `a, b, c)`; the opening parenthesis is already consumed
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            args.push(self.parse_expression()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let line = token.line;
        let kind = match token.kind {
            TokenKind::Number(text) => {
                self.advance();
                ExprKind::Number(text)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::This => {
                self.advance();
                ExprKind::This
            }
            TokenKind::Identifier(name) => {
                self.advance();
                ExprKind::Identifier(name)
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RightBracket) {
                    items.push(self.parse_expression()?);
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RightBracket)?;
                ExprKind::ArrayLiteral(items)
            }
            TokenKind::New => {
                self.advance();
                let class = self.expect_name()?;
                self.consume(TokenKind::LeftParen)?;
                let args = self.parse_arguments()?;
                ExprKind::New { class, args }
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.check(&TokenKind::RightBrace) {
                    let key = self.expect_name()?;
                    self.consume(TokenKind::Colon)?;
                    entries.push((key, self.parse_expression()?));
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RightBrace)?;
                ExprKind::Object(entries)
            }
            _ => {
                return Err(self.expected_error(
                    "an expression",
                    Some("Expected one of: number, string, boolean, identifier, `this`, `(`, `[`"),
                ))
            }
        };
        Ok(Expr::new(kind, line))
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current - 1].clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            if matches!(token.kind, TokenKind::Eof) {
                return Err(Error::UnexpectedEof);
            }
            Err(Error::SyntaxError {
                line: token.line,
                col: token.column,
                message: format!(
                    "Expected {}, found {}",
                    Self::token_kind_name(&kind),
                    Self::token_kind_name(&token.kind)
                ),
            })
        }
    }

    /// Identifier, or a keyword usable as a member name (`from`, `default`)
    fn expect_name(&mut self) -> Result<String> {
        let kind = self.peek().kind.clone();
        if let TokenKind::Identifier(name) = kind {
            self.advance();
            return Ok(name);
        }
        if let Some(name) = kind.as_property_name() {
            self.advance();
            return Ok(name.to_string());
        }
        Err(self.expected_error("an identifier", None))
    }

    /// Get a human-readable name for a token kind
    fn token_kind_name(kind: &TokenKind) -> String {
        match kind {
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::LeftBracket => "`[`".to_string(),
            TokenKind::RightBracket => "`]`".to_string(),
            TokenKind::LeftBrace => "`{`".to_string(),
            TokenKind::RightBrace => "`}`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Assign => "`=`".to_string(),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::True | TokenKind::False => "boolean".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            k if k.is_keyword() => format!("keyword {:?}", k).to_lowercase(),
            _ => format!("{:?}", kind),
        }
    }

    /// Helper to create a syntax error with expected/got pattern
    fn expected_error(&self, expected: &str, hint: Option<&str>) -> Error {
        let token = self.peek();
        let got_str = Self::token_kind_name(&token.kind);

        let mut message = format!("Expected {}, found {}", expected, got_str);

        if let Some(hint) = hint {
            message.push_str("\n\nHelp: ");
            message.push_str(hint);
        }

        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message,
        }
    }

    /// Syntax error pointing at the token just consumed
    fn previous_error(&self, expected: &str) -> Error {
        let token = &self.tokens[self.current.saturating_sub(1)];
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: format!(
                "Expected {}, found {}",
                expected,
                Self::token_kind_name(&token.kind)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse_str(source: &str) -> Result<SourceFile> {
        let tokens = Scanner::new(source).scan_tokens()?;
        Parser::new(tokens).with_path("test.ts").parse()
    }

    fn parse_expr(source: &str) -> Expr {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    #[test]
    fn test_contract_class_with_members() {
        let file = parse_str(
            r#"
@Contract
export class Counter {
  count: U256;
  constructor() { }
  @External
  increment(): void { this.count = this.count.add(U256Factory.fromString("1")); }
}
"#,
        )
        .unwrap();

        let class = file.classes().next().unwrap();
        assert_eq!(class.name.as_deref(), Some("Counter"));
        assert!(class.has_decorator("Contract"));
        assert!(class.exported);
        assert_eq!(class.properties().count(), 1);
        assert_eq!(class.constructors().count(), 1);
        let method = class.methods().next().unwrap();
        assert_eq!(method.name, "increment");
        assert_eq!(method.decorators[0].name, "External");
        assert_eq!(method.return_type, Some(TypeRef::named("void")));
    }

    #[test]
    fn test_import_and_heritage() {
        let file = parse_str(
            r#"
import { Base } from "./base";
@Contract
export class Child extends Base, Other { }
"#,
        )
        .unwrap();
        assert_eq!(file.imports[0].names, vec!["Base".to_string()]);
        assert_eq!(file.imports[0].from, "./base");
        let class = file.classes().next().unwrap();
        assert_eq!(class.heritage, vec!["Base".to_string(), "Other".to_string()]);
        assert!(file.import_for("Base").is_some());
    }

    #[test]
    fn test_generic_types() {
        let file = parse_str(
            "@Contract export class C { m: MappingNested<Address, Address, U256>; a: StaticArray<U256, 4>; d: U256[]; }",
        )
        .unwrap();
        let class = file.classes().next().unwrap();
        let types: Vec<String> = class
            .properties()
            .map(|p| p.ty.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(
            types,
            vec![
                "MappingNested<Address, Address, U256>",
                "StaticArray<U256, 4>",
                "U256[]"
            ]
        );
    }

    #[test]
    fn test_error_factory_const() {
        let file = parse_str("export const Oops = ErrorFactory.create<[Address, U256]>();").unwrap();
        let decl = file.consts().next().unwrap();
        assert_eq!(decl.name, "Oops");
        match &decl.value.kind {
            ExprKind::Call { type_args, args, .. } => {
                assert!(args.is_empty());
                assert_eq!(
                    type_args[0],
                    TypeRef::Tuple(vec![TypeRef::named("Address"), TypeRef::named("U256")])
                );
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_less_than_is_not_type_args() {
        let expr = parse_expr("a < b");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Lt,
                ..
            }
        ));
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("a + b * c == d && e");
        match expr.kind {
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                ..
            } => match left.kind {
                ExprKind::Binary {
                    op: BinaryOp::Eq,
                    left,
                    ..
                } => assert!(matches!(
                    left.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                )),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment() {
        let expr = parse_expr("this.total += amount");
        assert!(matches!(
            expr.kind,
            ExprKind::Assign {
                op: Some(BinaryOp::Add),
                ..
            }
        ));
    }

    #[test]
    fn test_interface_signature_has_no_body() {
        let file =
            parse_str("@Interface export class IToken { balanceOf(owner: Address): U256; }").unwrap();
        let method = file.classes().next().unwrap().methods().next().unwrap();
        assert!(method.body.is_none());
        assert_eq!(method.params[0].name, "owner");
    }

    #[test]
    fn test_control_flow_statements() {
        let file = parse_str(
            r#"
@Contract
export class Loops {
  run(n: U256): void {
    for (let i = U256Factory.create(); i.lessThan(n); i = i.add(U256Factory.fromString("1"))) { }
    while (false) { }
    do { } while (false);
    if (true) { } else if (false) { } else { }
  }
}
"#,
        )
        .unwrap();
        let method = file.classes().next().unwrap().methods().next().unwrap();
        let body = method.body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 4);
        assert!(matches!(body.stmts[0].kind, StmtKind::For { .. }));
        assert!(matches!(body.stmts[1].kind, StmtKind::While { .. }));
        assert!(matches!(body.stmts[2].kind, StmtKind::DoWhile { .. }));
        assert!(matches!(body.stmts[3].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_missing_brace_reports_eof() {
        let err = parse_str("@Contract export class C { count: U256;").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn test_anonymous_class() {
        let file = parse_str("@Contract export default class { }").unwrap();
        assert!(file.classes().next().unwrap().name.is_none());
    }
}
