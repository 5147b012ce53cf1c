//! Semantic types and method attributes carried by every IR node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed slot/word size in bytes for every scalar kind
pub const WORD_SIZE: u64 = 32;

/// Resolved semantic type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemType {
    /// 256-bit unsigned integer
    U256,
    /// 256-bit signed integer
    I256,
    /// 20-byte account address
    Address,
    /// Variable-length text
    Str,
    /// Boolean
    Bool,
    /// No value (method results only)
    Void,
    /// `Mapping<K, V>`
    Mapping {
        /// Key type
        key: Box<SemType>,
        /// Value type
        value: Box<SemType>,
    },
    /// `MappingNested<K1, K2, V>`
    MappingNested {
        /// Outer key type
        key1: Box<SemType>,
        /// Inner key type
        key2: Box<SemType>,
        /// Value type
        value: Box<SemType>,
    },
    /// `StaticArray<T, N>`
    StaticArray {
        /// Element type
        element: Box<SemType>,
        /// Fixed length
        length: u64,
    },
    /// `T[]`
    DynamicArray(Box<SemType>),
    /// Named struct
    Struct(String),
    /// Named interface (an address with a typed call surface)
    Interface(String),
}

impl SemType {
    /// Wide integer (signed or unsigned)
    pub fn is_wide_int(&self) -> bool {
        matches!(self, SemType::U256 | SemType::I256)
    }

    /// Signed wide integer
    pub fn is_signed(&self) -> bool {
        matches!(self, SemType::I256)
    }

    /// Single-word value types that can live in a mapping or array slot
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SemType::U256 | SemType::I256 | SemType::Address | SemType::Str | SemType::Bool
        )
    }

    /// Variable-length in ABI encoding
    pub fn is_dynamic(&self) -> bool {
        matches!(self, SemType::Str | SemType::DynamicArray(_))
    }

    /// Mapping of either arity
    pub fn is_mapping(&self) -> bool {
        matches!(self, SemType::Mapping { .. } | SemType::MappingNested { .. })
    }

    /// Element type of either array kind
    pub fn array_element(&self) -> Option<&SemType> {
        match self {
            SemType::StaticArray { element, .. } | SemType::DynamicArray(element) => Some(element),
            _ => None,
        }
    }

    /// Canonical ABI name for scalar types; unknown kinds default to `uint256`
    pub fn abi_name(&self) -> &'static str {
        match self {
            SemType::U256 => "uint256",
            SemType::I256 => "int256",
            SemType::Bool => "bool",
            SemType::Address | SemType::Interface(_) => "address",
            SemType::Str => "string",
            _ => "uint256",
        }
    }

    /// Type name used in emitted source
    pub fn runtime_name(&self) -> String {
        match self {
            SemType::U256 => "U256".to_string(),
            SemType::I256 => "I256".to_string(),
            SemType::Address | SemType::Interface(_) => "Address".to_string(),
            SemType::Str => "Str".to_string(),
            SemType::Bool => "boolean".to_string(),
            SemType::Void => "void".to_string(),
            SemType::StaticArray { element, .. } | SemType::DynamicArray(element) => {
                format!("Array<{}>", element.runtime_name())
            }
            // Structs and mappings are handled through pointers / slots
            SemType::Struct(_) | SemType::Mapping { .. } | SemType::MappingNested { .. } => {
                "usize".to_string()
            }
        }
    }

    /// Storage helper suffix (`Storage.load<suffix>`)
    pub fn storage_suffix(&self) -> &'static str {
        match self {
            SemType::U256 => "U256",
            SemType::I256 => "I256",
            SemType::Address | SemType::Interface(_) => "Address",
            SemType::Str => "Str",
            SemType::Bool => "Boolean",
            _ => "U256",
        }
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::U256 => write!(f, "U256"),
            SemType::I256 => write!(f, "I256"),
            SemType::Address => write!(f, "Address"),
            SemType::Str => write!(f, "Str"),
            SemType::Bool => write!(f, "boolean"),
            SemType::Void => write!(f, "void"),
            SemType::Mapping { key, value } => write!(f, "Mapping<{}, {}>", key, value),
            SemType::MappingNested { key1, key2, value } => {
                write!(f, "MappingNested<{}, {}, {}>", key1, key2, value)
            }
            SemType::StaticArray { element, length } => {
                write!(f, "StaticArray<{}, {}>", element, length)
            }
            SemType::DynamicArray(element) => write!(f, "{}[]", element),
            SemType::Struct(name) | SemType::Interface(name) => write!(f, "{}", name),
        }
    }
}

/// Where a value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VarScope {
    /// Transient execution memory
    #[default]
    Memory,
    /// Persistent contract storage (accessed through generated accessors)
    Storage,
}

/// Method visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Callable externally and internally
    #[default]
    Public,
    /// Callable externally only
    External,
    /// Not exported
    Internal,
}

impl Visibility {
    /// Whether the method gets an exported entry point and an ABI entry
    pub fn is_exported(self) -> bool {
        !matches!(self, Visibility::Internal)
    }
}

/// State mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateMutability {
    /// Neither reads nor writes storage
    Pure,
    /// Reads storage only
    View,
    /// Default: may write storage, rejects value
    #[default]
    Nonpayable,
    /// May write storage and accept value
    Payable,
}

impl StateMutability {
    /// ABI spelling
    pub fn as_str(self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::Nonpayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    /// Storage writes are rejected
    pub fn is_read_only(self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

/// Special entry-point role of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodRole {
    /// Ordinary selector-dispatched method
    #[default]
    Regular,
    /// Runs when no selector matches
    Fallback,
    /// Runs on empty calldata
    Receive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_names() {
        assert_eq!(SemType::U256.abi_name(), "uint256");
        assert_eq!(SemType::I256.abi_name(), "int256");
        assert_eq!(SemType::Bool.abi_name(), "bool");
        assert_eq!(SemType::Str.abi_name(), "string");
        assert_eq!(SemType::Interface("IToken".into()).abi_name(), "address");
        // Fallback for kinds without a scalar name
        assert_eq!(
            SemType::Mapping {
                key: Box::new(SemType::Address),
                value: Box::new(SemType::U256)
            }
            .abi_name(),
            "uint256"
        );
    }

    #[test]
    fn test_dynamic_kinds() {
        assert!(SemType::Str.is_dynamic());
        assert!(SemType::DynamicArray(Box::new(SemType::U256)).is_dynamic());
        assert!(!SemType::Address.is_dynamic());
    }

    #[test]
    fn test_read_only_mutability() {
        assert!(StateMutability::View.is_read_only());
        assert!(!StateMutability::Payable.is_read_only());
        assert!(!Visibility::Internal.is_exported());
    }
}
