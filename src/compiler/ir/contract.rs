use serde::{Deserialize, Serialize};

use super::expr::IrExpr;
use super::stmt::IrStmt;
use super::types::{MethodRole, SemType, StateMutability, Visibility, WORD_SIZE};

/// Contract-level storage declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageVariable {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: SemType,
    /// First slot of the range
    pub slot: usize,
    /// Width of the slot range
    pub field_count: usize,
    /// Initializer run by `deploy` after defaults
    pub initializer: Option<IrExpr>,
}

/// Typed parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrParam {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: SemType,
}

/// Contract method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrMethod {
    /// Method name
    pub name: String,
    /// Visibility
    pub visibility: Visibility,
    /// State mutability
    pub mutability: StateMutability,
    /// Fallback / receive role
    pub role: MethodRole,
    /// Inputs in order
    pub inputs: Vec<IrParam>,
    /// Result type, `None` for void
    pub output: Option<SemType>,
    /// Body
    pub body: Vec<IrStmt>,
}

/// Constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrConstructor {
    /// Inputs in order
    pub inputs: Vec<IrParam>,
    /// Body
    pub body: Vec<IrStmt>,
    /// Whether the constructor accepts value
    pub payable: bool,
}

/// Laid-out struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrStructField {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: SemType,
    /// Byte offset from the struct start
    pub offset: u64,
    /// Byte size
    pub size: u64,
    /// Variable-length field
    pub dynamic: bool,
}

/// Struct with computed layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrStruct {
    /// Struct name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<IrStructField>,
    /// Sum of field sizes
    pub total_size: u64,
    /// At least one variable-length field
    pub dynamic: bool,
    /// Field alignment
    pub alignment: u64,
}

impl IrStruct {
    /// Finds a field by name
    pub fn field(&self, name: &str) -> Option<&IrStructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field position in declaration order
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// ABI head size: one word per field
    pub fn head_size(&self) -> u64 {
        self.fields.len() as u64 * WORD_SIZE
    }
}

/// Event field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEventField {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: SemType,
    /// Written to a topic instead of data
    pub indexed: bool,
}

/// Event declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEvent {
    /// Event name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<IrEventField>,
    /// Keccak-256 of the canonical signature
    pub topic0: [u8; 32],
}

/// Error field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrErrorField {
    /// Positional name (`arg0`, `arg1`, ...)
    pub name: String,
    /// Field type
    pub ty: SemType,
}

/// Custom error declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrErrorDecl {
    /// Error name
    pub name: String,
    /// Fields in positional order
    pub fields: Vec<IrErrorField>,
    /// First four bytes of the signature hash
    pub selector: [u8; 4],
}

/// Method signature on an interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrInterfaceMethod {
    /// Method name
    pub name: String,
    /// Inputs in order
    pub inputs: Vec<IrParam>,
    /// Result type
    pub output: Option<SemType>,
    /// Declared mutability
    pub mutability: StateMutability,
    /// Function selector
    pub selector: [u8; 4],
}

/// External contract interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrInterface {
    /// Interface name
    pub name: String,
    /// Method signatures
    pub methods: Vec<IrInterfaceMethod>,
}

impl IrInterface {
    /// Finds a method by name
    pub fn method(&self, name: &str) -> Option<&IrInterfaceMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Fully analyzed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrContract {
    /// Contract class name
    pub name: String,
    /// Source path the contract was built from
    pub path: String,
    /// Parent contract, when the class extends another
    pub parent: Option<Box<IrContract>>,
    /// Own storage declarations in slot order
    pub storage: Vec<StorageVariable>,
    /// Own methods in declaration order
    pub methods: Vec<IrMethod>,
    /// Own constructor
    pub constructor: Option<IrConstructor>,
    /// Structs declared in (or imported by) this unit
    pub structs: Vec<IrStruct>,
    /// Events declared in (or imported by) this unit
    pub events: Vec<IrEvent>,
    /// Errors declared in (or imported by) this unit
    pub errors: Vec<IrErrorDecl>,
    /// Interfaces declared in (or imported by) this unit
    pub interfaces: Vec<IrInterface>,
}

impl IrContract {
    /// Ancestors from the root down, followed by `self`
    fn lineage(&self) -> Vec<&IrContract> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(contract) = current {
            chain.push(contract);
            current = contract.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Storage of the whole inheritance chain, inherited first
    pub fn all_storage(&self) -> Vec<&StorageVariable> {
        self.lineage()
            .into_iter()
            .flat_map(|c| c.storage.iter())
            .collect()
    }

    /// Methods visible on this contract; a local method overrides an
    /// inherited one of the same name
    pub fn all_methods(&self) -> Vec<&IrMethod> {
        let mut methods: Vec<&IrMethod> = Vec::new();
        for contract in self.lineage() {
            for method in &contract.methods {
                match methods.iter().position(|m| m.name == method.name) {
                    Some(idx) => methods[idx] = method,
                    None => methods.push(method),
                }
            }
        }
        methods
    }

    /// Exported methods in ABI order
    pub fn exported_methods(&self) -> Vec<&IrMethod> {
        self.all_methods()
            .into_iter()
            .filter(|m| m.visibility.is_exported())
            .collect()
    }

    /// Constructors to run at deploy, root ancestor first
    pub fn constructor_chain(&self) -> Vec<&IrConstructor> {
        self.lineage()
            .into_iter()
            .filter_map(|c| c.constructor.as_ref())
            .collect()
    }

    /// The constructor whose inputs form the deploy ABI
    pub fn effective_constructor(&self) -> Option<&IrConstructor> {
        self.constructor
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.effective_constructor()))
    }

    /// Structs of the whole chain, deduplicated by name
    pub fn all_structs(&self) -> Vec<&IrStruct> {
        dedup_by_name(self.lineage().into_iter().flat_map(|c| c.structs.iter()), |s| {
            &s.name
        })
    }

    /// Events of the whole chain, deduplicated by name
    pub fn all_events(&self) -> Vec<&IrEvent> {
        dedup_by_name(self.lineage().into_iter().flat_map(|c| c.events.iter()), |e| {
            &e.name
        })
    }

    /// Errors of the whole chain, deduplicated by name
    pub fn all_errors(&self) -> Vec<&IrErrorDecl> {
        dedup_by_name(self.lineage().into_iter().flat_map(|c| c.errors.iter()), |e| {
            &e.name
        })
    }

    /// Interfaces of the whole chain, deduplicated by name
    pub fn all_interfaces(&self) -> Vec<&IrInterface> {
        dedup_by_name(
            self.lineage().into_iter().flat_map(|c| c.interfaces.iter()),
            |i| &i.name,
        )
    }

    /// Looks up a struct anywhere in the chain
    pub fn find_struct(&self, name: &str) -> Option<&IrStruct> {
        self.all_structs().into_iter().find(|s| s.name == name)
    }
}

fn dedup_by_name<'a, T, I, F>(items: I, name: F) -> Vec<&'a T>
where
    I: Iterator<Item = &'a T>,
    F: Fn(&T) -> &String,
{
    let mut out: Vec<&'a T> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| name(seen) == name(item)) {
            out.push(item);
        }
    }
    out
}
