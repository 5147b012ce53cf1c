//! Contract source parser
//!
//! Parses the class-based, decorator-annotated contract syntax into a syntax
//! tree ([`SourceFile`]). This is the syntax-tree provider consumed by the IR
//! builders; it knows nothing about types, slots or code generation.

mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{
    BinaryOp, Block, ClassDecl, ClassMember, ConstDecl, ConstructorDecl, Declaration, Decorator,
    Expr, ExprKind, ImportDecl, MethodDecl, Param, PropertyDecl, SourceFile, Stmt, StmtKind,
    TypeRef, UnaryOp,
};
pub use parser::Parser;

use crate::error::Result;
use crate::lexer::Scanner;

/// Scans and parses `source`, labelling the result with `path`
pub fn parse_source(path: &str, source: &str) -> Result<SourceFile> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens).with_path(path).parse()
}
