//! Per-contract compilation state
//!
//! A [`CompilationContext`] owns the diagnostics, symbol table and slot
//! allocator of one compilation unit, plus the declarations (events, errors,
//! interfaces) the builders register while walking it. The [`ContextFactory`]
//! caches contexts by contract identifier for the lifetime of a session.

use std::collections::{HashMap, HashSet};

use super::diagnostics::{DiagnosticsManager, SemanticCode, SyntaxCode};
use super::ir::{IrErrorDecl, IrEvent, IrInterface, SemType, StateMutability, Visibility};
use super::symbols::SymbolTableStack;

/// Method currently being built
#[derive(Debug, Clone)]
pub struct MethodFrame {
    /// Method name (`constructor` for the constructor)
    pub name: String,
    /// Declared mutability
    pub mutability: StateMutability,
    /// Declared visibility
    pub visibility: Visibility,
    /// Declared result type
    pub return_type: Option<SemType>,
}

/// State threaded through every builder of one compilation unit
#[derive(Debug, Clone)]
pub struct CompilationContext {
    /// Contract identifier (canonical source path)
    pub contract_id: String,
    /// Source path used in diagnostics
    pub file: String,
    /// Recorded findings
    pub diagnostics: DiagnosticsManager,
    /// Scoped symbols and slot allocator
    pub symbols: SymbolTableStack,
    /// Registered events, in declaration order
    pub events: Vec<IrEvent>,
    /// Registered custom errors, in declaration order
    pub errors: Vec<IrErrorDecl>,
    /// Registered interfaces, in declaration order
    pub interfaces: Vec<IrInterface>,
    /// Struct names declared in the unit but not laid out yet
    pub pending_structs: HashSet<String>,
    /// Method whose body is being built
    pub method: Option<MethodFrame>,
}

impl CompilationContext {
    /// Fresh context for `contract_id`
    pub fn new(contract_id: &str, file: &str) -> Self {
        CompilationContext {
            contract_id: contract_id.to_string(),
            file: file.to_string(),
            diagnostics: DiagnosticsManager::new(),
            symbols: SymbolTableStack::new(),
            events: Vec::new(),
            errors: Vec::new(),
            interfaces: Vec::new(),
            pending_structs: HashSet::new(),
            method: None,
        }
    }

    /// Records a syntax finding in this unit's file
    pub fn syntax_error(&mut self, code: SyntaxCode, line: usize, args: &[String]) {
        let file = self.file.clone();
        self.diagnostics.add_syntax_error(code, &file, line, args);
    }

    /// Records a semantic finding in this unit's file
    pub fn semantic_error(&mut self, code: SemanticCode, line: usize, args: &[String]) {
        let file = self.file.clone();
        self.diagnostics.add_semantic_error(code, &file, line, args);
    }

    /// Event by name
    pub fn event(&self, name: &str) -> Option<&IrEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Custom error by name
    pub fn error_decl(&self, name: &str) -> Option<&IrErrorDecl> {
        self.errors.iter().find(|e| e.name == name)
    }

    /// Interface by name
    pub fn interface(&self, name: &str) -> Option<&IrInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Registers an event unless one with the same name exists
    pub fn register_event(&mut self, event: IrEvent) {
        if self.event(&event.name).is_none() {
            self.events.push(event);
        }
    }

    /// Registers an error unless one with the same name exists
    pub fn register_error(&mut self, error: IrErrorDecl) {
        if self.error_decl(&error.name).is_none() {
            self.errors.push(error);
        }
    }

    /// Registers an interface unless one with the same name exists
    pub fn register_interface(&mut self, interface: IrInterface) {
        if self.interface(&interface.name).is_none() {
            self.interfaces.push(interface);
        }
    }

    /// Copies declarations a parent unit made visible
    pub fn inherit_declarations(&mut self, parent: &CompilationContext) {
        for event in &parent.events {
            self.register_event(event.clone());
        }
        for error in &parent.errors {
            self.register_error(error.clone());
        }
        for interface in &parent.interfaces {
            self.register_interface(interface.clone());
        }
    }

    /// Mutability of the method being built (`None` outside methods)
    pub fn current_mutability(&self) -> Option<StateMutability> {
        self.method.as_ref().map(|m| m.mutability)
    }

    /// Name of the method being built
    pub fn current_method_name(&self) -> String {
        self.method
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }
}

/// Caches one [`CompilationContext`] per contract identifier
#[derive(Debug, Default)]
pub struct ContextFactory {
    contexts: HashMap<String, CompilationContext>,
}

impl ContextFactory {
    /// Creates an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `contract_id`, if one was created
    pub fn get(&self, contract_id: &str) -> Option<&CompilationContext> {
        self.contexts.get(contract_id)
    }

    /// Removes and returns the context so it can be built without
    /// borrowing the factory
    pub fn checkout(&mut self, contract_id: &str, file: &str) -> CompilationContext {
        self.contexts
            .remove(contract_id)
            .unwrap_or_else(|| CompilationContext::new(contract_id, file))
    }

    /// Returns a checked-out context to the cache
    pub fn checkin(&mut self, context: CompilationContext) {
        self.contexts.insert(context.contract_id.clone(), context);
    }

    /// Number of cached contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no context is cached
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Drops every cached context; call between independent runs
    pub fn reset(&mut self) {
        self.contexts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_caches_by_id() {
        let mut factory = ContextFactory::new();
        let mut ctx = factory.checkout("a.ts", "a.ts");
        ctx.syntax_error(SyntaxCode::EmptySource, 1, &[]);
        factory.checkin(ctx);
        assert_eq!(factory.len(), 1);
        assert!(factory.checkout("a.ts", "a.ts").diagnostics.has_errors());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut factory = ContextFactory::new();
        let mut ctx = factory.checkout("a.ts", "a.ts");
        ctx.syntax_error(SyntaxCode::EmptySource, 1, &[]);
        factory.checkin(ctx);
        factory.reset();
        assert!(factory.is_empty());
        assert!(!factory.checkout("a.ts", "a.ts").diagnostics.has_errors());
    }

    #[test]
    fn test_checkout_round_trip() {
        let mut factory = ContextFactory::new();
        let mut ctx = factory.checkout("b.ts", "b.ts");
        ctx.semantic_error(SemanticCode::DuplicateMethod, 3, &["f".into()]);
        factory.checkin(ctx);
        assert_eq!(factory.get("b.ts").unwrap().diagnostics.len(), 1);
    }
}
