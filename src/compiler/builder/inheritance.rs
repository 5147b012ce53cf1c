//! Multi-file analysis: parent contracts and imported declarations
//!
//! An [`AnalysisSession`] analyzes a file and, recursively, the file its
//! contract extends. Each unit gets its own [`CompilationContext`] from the
//! session's [`ContextFactory`]; analyzed contracts are memoized by path
//! until [`AnalysisSession::reset`].

use std::collections::HashMap;

use super::contract::{contract_classes, ClassRole, ContractBuilder};
use super::errors::is_error_decl;
use super::IrBuilder;
use crate::compiler::context::{CompilationContext, ContextFactory};
use crate::compiler::diagnostics::SemanticCode;
use crate::compiler::ir::IrContract;
use crate::compiler::source::{is_relative, SourceProvider};
use crate::error::{Error, Result};
use crate::parser::{parse_source, Declaration, SourceFile};

/// Default limit on the number of ancestors of a contract
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// An analyzed parent together with the context it was built in
#[derive(Debug, Clone)]
pub struct ResolvedParent {
    /// Parent contract IR
    pub contract: IrContract,
    /// Parent unit's context (symbols, slots, declarations, diagnostics)
    pub context: CompilationContext,
}

/// State shared by the units analyzed for one compilation
#[derive(Debug)]
pub struct AnalysisSession {
    factory: ContextFactory,
    cache: HashMap<String, IrContract>,
    in_progress: Vec<String>,
    max_depth: usize,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl AnalysisSession {
    /// Creates a session allowing at most `max_depth` ancestors
    pub fn new(max_depth: usize) -> Self {
        AnalysisSession {
            factory: ContextFactory::new(),
            cache: HashMap::new(),
            in_progress: Vec::new(),
            max_depth,
        }
    }

    /// Forgets every analyzed unit
    pub fn reset(&mut self) {
        self.factory.reset();
        self.cache.clear();
        self.in_progress.clear();
    }

    /// Context a unit was analyzed in
    pub fn context(&self, path: &str) -> Option<&CompilationContext> {
        self.factory.get(path)
    }

    /// Number of units analyzed so far
    pub fn units(&self) -> usize {
        self.factory.len()
    }

    /// Reads and analyzes `path`
    pub fn analyze_path(&mut self, provider: &dyn SourceProvider, path: &str) -> Result<IrContract> {
        if let Some(contract) = self.cache.get(path) {
            return Ok(contract.clone());
        }
        let source = provider.read(path)?;
        self.analyze_source(provider, path, &source)
    }

    /// Analyzes `source` as the contents of `path`
    pub fn analyze_source(
        &mut self,
        provider: &dyn SourceProvider,
        path: &str,
        source: &str,
    ) -> Result<IrContract> {
        if let Some(contract) = self.cache.get(path) {
            return Ok(contract.clone());
        }
        let file = parse_source(path, source)?;
        self.analyze_file(provider, &file)
    }

    fn analyze_file(&mut self, provider: &dyn SourceProvider, file: &SourceFile) -> Result<IrContract> {
        tracing::debug!(path = %file.path, depth = self.in_progress.len(), "analyzing unit");
        self.in_progress.push(file.path.clone());
        let mut ctx = self.factory.checkout(&file.path, &file.path);
        let result = self.build_unit(provider, file, &mut ctx);
        self.factory.checkin(ctx);
        self.in_progress.pop();

        if let Ok(contract) = &result {
            self.cache.insert(file.path.clone(), contract.clone());
        }
        result
    }

    fn build_unit(
        &mut self,
        provider: &dyn SourceProvider,
        file: &SourceFile,
        ctx: &mut CompilationContext,
    ) -> Result<IrContract> {
        let parent = self.resolve_parent(provider, file, ctx)?;
        let parent_path = parent.as_ref().map(|p| p.contract.path.clone());
        let imported = resolve_imports(provider, file, parent_path.as_deref(), ctx)?;
        ContractBuilder::new(file)
            .with_parent(parent)
            .with_imports(imported)
            .validate_and_build_ir(ctx)
    }

    fn resolve_parent(
        &mut self,
        provider: &dyn SourceProvider,
        file: &SourceFile,
        ctx: &mut CompilationContext,
    ) -> Result<Option<ResolvedParent>> {
        let contracts = contract_classes(file);
        let [contract] = contracts.as_slice() else {
            return Ok(None);
        };
        let Some(parent_name) = contract.heritage.first() else {
            return Ok(None);
        };
        let line = contract.line;
        let unresolved = |ctx: &mut CompilationContext| {
            ctx.semantic_error(SemanticCode::UnresolvedParent, line, &[parent_name.clone()]);
        };

        let import = match file.import_for(parent_name) {
            Some(import) if is_relative(&import.from) => import,
            _ => {
                unresolved(ctx);
                return Ok(None);
            }
        };
        let parent_path = provider.resolve(&file.path, &import.from);

        if self.in_progress.contains(&parent_path) {
            ctx.semantic_error(SemanticCode::InheritanceCycle, line, &[parent_name.clone()]);
            return Ok(None);
        }
        if self.in_progress.len() > self.max_depth {
            ctx.semantic_error(
                SemanticCode::InheritanceTooDeep,
                line,
                &[contract.display_name().to_string(), self.max_depth.to_string()],
            );
            return Ok(None);
        }

        let analyzed = match provider.read(&parent_path) {
            Ok(source) => self.analyze_source(provider, &parent_path, &source),
            Err(e) => Err(e),
        };
        let parent = match analyzed {
            Ok(parent) => parent,
            Err(e @ (Error::SourceUnavailable { .. } | Error::ValidationFailed { .. })) => {
                tracing::warn!(parent = %parent_name, path = %parent_path, error = %e, "parent not analyzed");
                unresolved(ctx);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if &parent.name != parent_name {
            unresolved(ctx);
            return Ok(None);
        }

        let context = self
            .factory
            .get(&parent_path)
            .cloned()
            .unwrap_or_else(|| CompilationContext::new(&parent_path, &parent_path));
        Ok(Some(ResolvedParent {
            contract: parent,
            context,
        }))
    }
}

/// Collects the struct, event, interface and error declarations named by
/// the file's relative imports
///
/// The parent's module is skipped; its declarations arrive through the
/// parent context. Imports are not followed transitively.
fn resolve_imports(
    provider: &dyn SourceProvider,
    file: &SourceFile,
    parent_path: Option<&str>,
    ctx: &mut CompilationContext,
) -> Result<Vec<Declaration>> {
    let contracts = contract_classes(file);
    let parent_name = contracts.first().and_then(|c| c.heritage.first());
    let mut imported = Vec::new();
    for import in &file.imports {
        if import.names.iter().all(|n| Some(n) == parent_name) {
            continue;
        }
        if !is_relative(&import.from) {
            tracing::debug!(module = %import.from, "skipping runtime import");
            continue;
        }
        let path = provider.resolve(&file.path, &import.from);
        if Some(path.as_str()) == parent_path {
            continue;
        }
        let source = match provider.read(&path) {
            Ok(source) => source,
            Err(e) => {
                ctx.semantic_error(
                    SemanticCode::UnresolvedImport,
                    import.line,
                    &[import.from.clone(), e.to_string()],
                );
                continue;
            }
        };
        let module = parse_source(&path, &source)?;
        let wanted = |name: &str| import.names.iter().any(|n| n == name);
        for decl in module.declarations {
            let keep = match &decl {
                Declaration::Class(class) => {
                    matches!(
                        ClassRole::of(class),
                        Some(ClassRole::Struct | ClassRole::Event | ClassRole::Interface)
                    ) && class.name.as_deref().is_some_and(wanted)
                }
                Declaration::Const(c) => is_error_decl(c) && wanted(&c.name),
            };
            if keep {
                imported.push(decl);
            }
        }
    }
    Ok(imported)
}
