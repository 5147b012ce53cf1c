//! Lexical analysis for contract sources
//!
//! Converts source text into a stream of tokens. Comments and whitespace are
//! dropped; every token keeps its 1-indexed line and column.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
