//! # Ascend compiler - contract classes to WASM contract source
//!
//! Compiles a decorator-annotated contract class (plus its structs, events,
//! errors and interfaces) to AssemblyScript-flavoured source for a
//! WASM-targeted contract runtime, together with its ABI document.
//!
//! ## Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → IR builders → IrContract → Emitter → source + ABI
//!                                  ↑ symbols, slots, layout, parent contract
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use ascend::compiler::{CompileOptions, Compiler};
//!
//! let mut compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile_file("contracts/token.ts")?;
//! std::fs::write("token.out.ts", &result.source)?;
//! std::fs::write("token.abi.json", &result.abi_json)?;
//! ```

pub mod abi;
pub mod builder;
pub mod context;
pub mod diagnostics;
pub mod emitter;
pub mod ir;
pub mod layout;
pub mod slots;
pub mod source;
pub mod symbols;
pub mod transform;

pub use abi::{AbiEntry, AbiParam, EntryKind};
pub use builder::inheritance::DEFAULT_MAX_DEPTH;
pub use builder::AnalysisSession;
pub use context::{CompilationContext, ContextFactory};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsManager, SemanticCode, SyntaxCode};
pub use emitter::{ContractEmitter, EmitOutput, DEFAULT_RUNTIME_MODULE};
pub use ir::IrContract;
pub use source::{FsSourceProvider, MemorySourceProvider, SourceProvider};

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// What to do when analysis recorded diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Stop after analysis and return [`Error::ValidationFailed`]
    #[default]
    FailFast,
    /// Emit anyway and attach the diagnostics to the result
    BestEffort,
}

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Validation policy
    pub validation_mode: ValidationMode,
    /// Add `event` and `error` entries to the ABI document
    pub abi_events_and_errors: bool,
    /// Emit the `user_entrypoint` selector dispatcher
    pub emit_entrypoint: bool,
    /// Module the generated source imports its runtime from
    pub runtime_module: String,
    /// Maximum number of ancestors of a contract
    pub max_inheritance_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::FailFast,
            abi_events_and_errors: true,
            emit_entrypoint: true,
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            max_inheritance_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompileOptions {
    /// Sets the validation policy
    pub fn validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Includes or omits event and error ABI entries
    pub fn abi_events_and_errors(mut self, include: bool) -> Self {
        self.abi_events_and_errors = include;
        self
    }

    /// Enables or disables the selector dispatcher
    pub fn emit_entrypoint(mut self, emit: bool) -> Self {
        self.emit_entrypoint = emit;
        self
    }

    /// Sets the runtime import path
    pub fn runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    /// Sets the inheritance depth limit
    pub fn max_inheritance_depth(mut self, depth: usize) -> Self {
        self.max_inheritance_depth = depth;
        self
    }
}

/// Compilation result with metadata
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Contract class name
    pub contract_name: String,
    /// Generated source text
    pub source: String,
    /// ABI entries
    pub abi: Vec<AbiEntry>,
    /// ABI document as pretty-printed JSON
    pub abi_json: String,
    /// Diagnostics recorded during analysis (only non-empty in best-effort mode)
    pub diagnostics: Vec<Diagnostic>,
    /// Codegen warnings
    pub warnings: Vec<String>,
    /// Analyzed contract
    pub ir: IrContract,
    /// SHA-256 of the generated source, hex encoded
    pub output_digest: String,
}

impl CompileResult {
    /// Whether analysis recorded anything
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Contract compiler
///
/// Owns the source provider and the analysis session. Each top-level
/// compilation starts from a fresh session.
pub struct Compiler {
    options: CompileOptions,
    provider: Box<dyn SourceProvider>,
    session: AnalysisSession,
}

impl Compiler {
    /// Compiler reading sources from the file system
    pub fn new(options: CompileOptions) -> Self {
        Self::with_provider(options, Box::new(FsSourceProvider::new()))
    }

    /// Compiler reading sources through `provider`
    pub fn with_provider(options: CompileOptions, provider: Box<dyn SourceProvider>) -> Self {
        let session = AnalysisSession::new(options.max_inheritance_depth);
        Self {
            options,
            provider,
            session,
        }
    }

    /// Options in effect
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Analysis context of a unit from the last compilation
    pub fn context(&self, path: &str) -> Option<&CompilationContext> {
        self.session.context(path)
    }

    /// Forgets every unit analyzed so far
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Reads `path` through the provider and compiles it
    pub fn compile_file(&mut self, path: &str) -> Result<CompileResult> {
        let source = self.provider.read(path)?;
        self.compile_source(path, &source)
    }

    /// Compiles `source` as the contents of `path`
    ///
    /// Relative imports are resolved against `path`.
    pub fn compile_source(&mut self, path: &str, source: &str) -> Result<CompileResult> {
        tracing::debug!(path = %path, mode = ?self.options.validation_mode, "compiling");
        self.session.reset();

        // Phase 1: analysis (parent contracts first)
        let contract = self
            .session
            .analyze_source(self.provider.as_ref(), path, source)?;
        let diagnostics = self
            .session
            .context(path)
            .map(|ctx| (ctx.diagnostics.errors(), ctx.diagnostics.render_report()))
            .unwrap_or_default();

        // Phase 2: validation policy
        let (diagnostics, report) = diagnostics;
        if !diagnostics.is_empty() {
            match self.options.validation_mode {
                ValidationMode::FailFast => {
                    return Err(Error::ValidationFailed {
                        count: diagnostics.len(),
                        report,
                    });
                }
                ValidationMode::BestEffort => {
                    tracing::warn!(
                        contract = %contract.name,
                        count = diagnostics.len(),
                        "emitting despite diagnostics"
                    );
                }
            }
        }

        // Phase 3: code generation
        let output = ContractEmitter::new(&contract)
            .with_runtime_module(&self.options.runtime_module)
            .with_entrypoint(self.options.emit_entrypoint)
            .emit();

        // Phase 4: ABI
        let abi = abi::generate(&contract, self.options.abi_events_and_errors);
        let abi_json = abi::to_json(&abi)?;

        let output_digest = hex::encode(Sha256::digest(output.source.as_bytes()));
        tracing::debug!(
            contract = %contract.name,
            digest = %output_digest,
            abi_entries = abi.len(),
            "compiled"
        );

        Ok(CompileResult {
            contract_name: contract.name.clone(),
            source: output.source,
            abi,
            abi_json,
            diagnostics,
            warnings: output.warnings,
            ir: contract,
            output_digest,
        })
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("units", &self.session.units())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = r#"
        @Contract
        export class Counter {
          count: U256;

          @Public
          increment(): void {
            this.count = this.count.add(U256Factory.fromString("1"));
          }

          @View
          get(): U256 {
            return this.count;
          }
        }
    "#;

    fn memory_compiler(options: CompileOptions) -> Compiler {
        Compiler::with_provider(options, Box::new(MemorySourceProvider::new()))
    }

    #[test]
    fn test_compile_counter() {
        let mut compiler = memory_compiler(CompileOptions::default());
        let result = compiler.compile_source("counter.ts", COUNTER).unwrap();
        assert_eq!(result.contract_name, "Counter");
        assert_eq!(result.ir.storage[0].slot, 0);
        assert!(result.source.contains("const SLOT_count: u64 = 0;"));
        assert_eq!(result.output_digest.len(), 64);
        assert!(!result.has_diagnostics());
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut compiler = memory_compiler(CompileOptions::default());
        let first = compiler.compile_source("counter.ts", COUNTER).unwrap();
        let second = compiler.compile_source("counter.ts", COUNTER).unwrap();
        assert_eq!(first.source, second.source);
        assert_eq!(first.output_digest, second.output_digest);
    }

    #[test]
    fn test_missing_file() {
        let mut compiler = memory_compiler(CompileOptions::default());
        let err = compiler.compile_file("nowhere.ts").unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[test]
    fn test_options_builder() {
        let options = CompileOptions::default()
            .validation_mode(ValidationMode::BestEffort)
            .abi_events_and_errors(false)
            .emit_entrypoint(false)
            .runtime_module("./rt")
            .max_inheritance_depth(2);
        assert_eq!(options.validation_mode, ValidationMode::BestEffort);
        assert!(!options.abi_events_and_errors);
        assert_eq!(options.runtime_module, "./rt");
        assert_eq!(options.max_inheritance_depth, 2);
    }
}
