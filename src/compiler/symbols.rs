//! Scoped symbol table
//!
//! Scope 0 is the contract scope: storage fields and method signatures live
//! there for the lifetime of the table. Method bodies push further scopes for
//! parameters and locals. Struct templates live in a separate, unscoped table.

use std::collections::HashMap;

use super::ir::{IrStruct, SemType, StateMutability, VarScope, Visibility};
use super::slots::SlotManager;
use crate::error::{Error, Result};

/// Variable metadata
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,
    /// Declared type
    pub ty: SemType,
    /// Memory local or storage field
    pub scope: VarScope,
    /// Scope depth it was declared at
    pub level: usize,
    /// Base slot, for storage variables
    pub slot: Option<usize>,
    /// Slot width, for storage variables
    pub field_count: usize,
    /// `let` (true) or `const` (false)
    pub mutable: bool,
}

impl VariableInfo {
    /// Memory local
    pub fn local(name: &str, ty: SemType, mutable: bool) -> Self {
        VariableInfo {
            name: name.to_string(),
            ty,
            scope: VarScope::Memory,
            level: 0,
            slot: None,
            field_count: 1,
            mutable,
        }
    }

    /// Storage field; slot and width are filled in on declaration
    pub fn storage(name: &str, ty: SemType) -> Self {
        VariableInfo {
            name: name.to_string(),
            ty,
            scope: VarScope::Storage,
            level: 0,
            slot: None,
            field_count: 1,
            mutable: true,
        }
    }
}

/// Method signature metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    /// Method name
    pub name: String,
    /// Result type, `None` for void
    pub return_type: Option<SemType>,
    /// Parameter types in order
    pub params: Vec<SemType>,
    /// Visibility
    pub visibility: Visibility,
    /// Mutability
    pub mutability: StateMutability,
}

/// Table entry
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// Variable (local or storage)
    Variable(VariableInfo),
    /// Method
    Function(FunctionInfo),
}

#[derive(Debug, Clone, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
    /// Declaration order, for deterministic merges
    order: Vec<String>,
}

impl Scope {
    fn insert(&mut self, name: &str, symbol: Symbol) {
        if self.symbols.insert(name.to_string(), symbol).is_none() {
            self.order.push(name.to_string());
        }
    }
}

/// Stack of lexical scopes plus the struct template table
#[derive(Debug, Clone)]
pub struct SymbolTableStack {
    scopes: Vec<Scope>,
    structs: HashMap<String, IrStruct>,
    slots: SlotManager,
}

impl Default for SymbolTableStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTableStack {
    /// Creates a table holding only the contract scope
    pub fn new() -> Self {
        SymbolTableStack {
            scopes: vec![Scope::default()],
            structs: HashMap::new(),
            slots: SlotManager::new(),
        }
    }

    /// Pushes a scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops a scope; the contract scope cannot be exited
    pub fn exit_scope(&mut self) -> Result<()> {
        if self.scopes.len() <= 1 {
            return Err(Error::compiler("cannot exit the contract scope"));
        }
        self.scopes.pop();
        Ok(())
    }

    /// Current depth (0 = contract scope)
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Declares a variable in the current scope
    ///
    /// Returns false when the name already exists in this scope. Storage
    /// declarations allocate their slot range here.
    pub fn declare_variable(&mut self, name: &str, mut info: VariableInfo) -> bool {
        let depth = self.depth();
        if self.scopes[depth].symbols.contains_key(name) {
            return false;
        }
        info.level = depth;
        if info.scope == VarScope::Storage {
            let field_count = self.field_count(&info.ty);
            info.field_count = field_count;
            info.slot = Some(self.slots.allocate(name, field_count));
        }
        self.scopes[depth].insert(name, Symbol::Variable(info));
        true
    }

    /// Slot width of a storage declaration
    fn field_count(&self, ty: &SemType) -> usize {
        let count = match ty {
            SemType::Struct(name) => self.structs.get(name).map(|s| s.fields.len()).unwrap_or(1),
            SemType::StaticArray { length, .. } => *length as usize,
            _ => 1,
        };
        count.max(1)
    }

    /// Declares a method signature in the contract scope
    pub fn declare_function(&mut self, info: FunctionInfo) -> bool {
        if self.scopes[0].symbols.contains_key(&info.name) {
            return false;
        }
        let name = info.name.clone();
        self.scopes[0].insert(&name, Symbol::Function(info));
        true
    }

    /// Nearest declaration of `name`, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
    }

    /// Nearest variable named `name`
    pub fn lookup_variable(&self, name: &str) -> Option<&VariableInfo> {
        match self.lookup(name)? {
            Symbol::Variable(info) => Some(info),
            Symbol::Function(_) => None,
        }
    }

    /// Storage field named `name`, ignoring locals that shadow it
    pub fn lookup_storage(&self, name: &str) -> Option<&VariableInfo> {
        match self.scopes[0].symbols.get(name)? {
            Symbol::Variable(info) if info.scope == VarScope::Storage => Some(info),
            _ => None,
        }
    }

    /// Method signature named `name`
    pub fn lookup_function(&self, name: &str) -> Option<&FunctionInfo> {
        match self.scopes[0].symbols.get(name)? {
            Symbol::Function(info) => Some(info),
            Symbol::Variable(_) => None,
        }
    }

    /// Registers a struct template
    pub fn declare_struct(&mut self, def: IrStruct) {
        self.structs.insert(def.name.clone(), def);
    }

    /// Struct template by name
    pub fn struct_template(&self, name: &str) -> Option<&IrStruct> {
        self.structs.get(name)
    }

    /// Slot allocator backing storage declarations
    pub fn slots(&self) -> &SlotManager {
        &self.slots
    }

    /// Mutable slot allocator, for absorbing a parent's layout
    pub fn slots_mut(&mut self) -> &mut SlotManager {
        &mut self.slots
    }

    /// Imports contract-level symbols and struct templates from `other`
    /// that are not already declared here
    pub fn merge(&mut self, other: &SymbolTableStack) {
        let theirs = &other.scopes[0];
        for name in &theirs.order {
            if self.lookup(name).is_none() {
                self.scopes[0].insert(name, theirs.symbols[name].clone());
            }
        }
        for (name, def) in &other.structs {
            self.structs
                .entry(name.clone())
                .or_insert_with(|| def.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::layout::compute_layout;

    #[test]
    fn test_duplicate_in_same_scope_rejected() {
        let mut table = SymbolTableStack::new();
        table.enter_scope();
        assert!(table.declare_variable("x", VariableInfo::local("x", SemType::U256, true)));
        assert!(!table.declare_variable("x", VariableInfo::local("x", SemType::Bool, true)));
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut table = SymbolTableStack::new();
        table.enter_scope();
        table.declare_variable("x", VariableInfo::local("x", SemType::U256, true));
        table.enter_scope();
        table.declare_variable("x", VariableInfo::local("x", SemType::Bool, true));
        assert_eq!(table.lookup_variable("x").unwrap().ty, SemType::Bool);
        assert_eq!(table.lookup_variable("x").unwrap().level, 2);
        table.exit_scope().unwrap();
        assert_eq!(table.lookup_variable("x").unwrap().ty, SemType::U256);
    }

    #[test]
    fn test_exit_contract_scope_fails() {
        let mut table = SymbolTableStack::new();
        assert!(table.exit_scope().is_err());
    }

    #[test]
    fn test_storage_declarations_allocate_slots() {
        let mut table = SymbolTableStack::new();
        table.declare_struct(compute_layout(
            "Position",
            &[
                ("owner".to_string(), SemType::Address),
                ("label".to_string(), SemType::Str),
                ("amount".to_string(), SemType::U256),
            ],
        ));
        let balances = SemType::Mapping {
            key: Box::new(SemType::Address),
            value: Box::new(SemType::U256),
        };
        table.declare_variable("balances", VariableInfo::storage("balances", balances));
        table.declare_variable(
            "position",
            VariableInfo::storage("position", SemType::Struct("Position".into())),
        );
        table.declare_variable("total", VariableInfo::storage("total", SemType::U256));

        assert_eq!(table.lookup_storage("balances").unwrap().slot, Some(0));
        let position = table.lookup_storage("position").unwrap();
        assert_eq!((position.slot, position.field_count), (Some(1), 3));
        assert_eq!(table.lookup_storage("total").unwrap().slot, Some(4));
    }

    #[test]
    fn test_merge_keeps_local_declarations() {
        let mut parent = SymbolTableStack::new();
        parent.declare_variable("owner", VariableInfo::storage("owner", SemType::Address));
        parent.declare_function(FunctionInfo {
            name: "greet".into(),
            return_type: None,
            params: vec![],
            visibility: Visibility::Public,
            mutability: StateMutability::View,
        });

        let mut child = SymbolTableStack::new();
        child.declare_function(FunctionInfo {
            name: "greet".into(),
            return_type: Some(SemType::U256),
            params: vec![],
            visibility: Visibility::External,
            mutability: StateMutability::View,
        });
        child.merge(&parent);

        assert!(child.lookup_storage("owner").is_some());
        assert_eq!(
            child.lookup_function("greet").unwrap().visibility,
            Visibility::External
        );
    }
}
