//! # Ascend - contract classes to WASM contract source
//!
//! Ascend compiles a TypeScript-like, decorator-annotated contract language
//! into AssemblyScript-flavoured source for a WASM-targeted smart-contract
//! runtime, together with the contract's ABI document.
//!
//! ## Quick Start
//!
//! ```rust
//! use ascend::compiler::{CompileOptions, Compiler, MemorySourceProvider};
//!
//! # fn main() -> ascend::Result<()> {
//! let source = r#"
//!     @Contract
//!     export class Counter {
//!       count: U256;
//!
//!       @External
//!       increment(): void {
//!         this.count = this.count.add(U256Factory.fromString("1"));
//!       }
//!     }
//! "#;
//!
//! let provider = MemorySourceProvider::new().with_file("counter.ts", source);
//! let mut compiler = Compiler::with_provider(CompileOptions::default(), Box::new(provider));
//! let result = compiler.compile_file("counter.ts")?;
//!
//! assert_eq!(result.contract_name, "Counter");
//! assert!(result.source.contains("function load_count(): U256"));
//! assert!(result.abi_json.contains("\"increment\""));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! - `@Contract` class: storage fields, methods, optional constructor,
//!   single inheritance via `extends` on a relatively imported contract
//! - `@Struct`, `@Event` (fields marked `@Indexed`) and `@Interface` classes
//! - custom errors: `const Insufficient = ErrorFactory.create<[Address, U256]>();`,
//!   raised with `Insufficient.revert(who, amount)`
//! - types: `U256`, `I256`, `Address`, `Str`, `boolean`, `Mapping<K, V>`,
//!   `MappingNested<K1, K2, V>`, `StaticArray<T, N>`, `T[]`, structs
//! - method decorators: `@External`, `@Public`, `@Internal`, `@View`, `@Pure`,
//!   `@Payable`, `@Fallback`, `@Receive`
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Tokens → Parser → AST → IR builders → IrContract → Emitter
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source text
//! - [`Parser`] - Parses tokens into a [`SourceFile`]
//! - [`compiler::builder`] - Builds the typed IR and records diagnostics
//! - [`compiler::transform`] - Lowers IR expressions and statements
//! - [`compiler::emitter`] - Assembles the generated contract
//! - [`compiler::abi`] - Selectors, topics, ABI encoders and the ABI document
//! - [`compiler::Compiler`] - Driver owning options, session and source provider
//!
//! ## Error Handling
//!
//! Hard failures are [`Error`] values. Findings in otherwise well-formed
//! source are collected as diagnostics with stable codes (`S0xx`, `E0xx`);
//! by default any finding fails the compilation with the full report:
//!
//! ```rust
//! use ascend::compiler::{CompileOptions, Compiler, MemorySourceProvider};
//! use ascend::Error;
//!
//! let provider = MemorySourceProvider::new().with_file("empty.ts", "");
//! let mut compiler = Compiler::with_provider(CompileOptions::default(), Box::new(provider));
//!
//! match compiler.compile_file("empty.ts") {
//!     Err(Error::ValidationFailed { report, .. }) => assert!(report.contains("S001")),
//!     other => panic!("unexpected: {:?}", other.map(|r| r.contract_name)),
//! }
//! ```

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;

pub use compiler::{CompileOptions, CompileResult, Compiler, ValidationMode};
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{parse_source, Parser, SourceFile};
