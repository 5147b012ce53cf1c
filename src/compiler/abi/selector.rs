//! Canonical signatures, selectors and event topics

use sha3::{Digest, Keccak256};

use crate::compiler::ir::{IrContract, IrStruct, SemType};
use crate::compiler::symbols::SymbolTableStack;

/// Resolves struct names to their layouts while rendering signatures
pub trait StructLookup {
    /// Struct named `name`, if known
    fn lookup_struct(&self, name: &str) -> Option<&IrStruct>;
}

impl StructLookup for SymbolTableStack {
    fn lookup_struct(&self, name: &str) -> Option<&IrStruct> {
        self.struct_template(name)
    }
}

impl StructLookup for IrContract {
    fn lookup_struct(&self, name: &str) -> Option<&IrStruct> {
        self.find_struct(name)
    }
}

impl StructLookup for Vec<IrStruct> {
    fn lookup_struct(&self, name: &str) -> Option<&IrStruct> {
        self.iter().find(|s| s.name == name)
    }
}

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Canonical ABI type name; structs render as tuples of their fields
pub fn canonical_type(ty: &SemType, structs: &dyn StructLookup) -> String {
    match ty {
        SemType::Struct(name) => match structs.lookup_struct(name) {
            Some(def) => {
                let inner: Vec<String> = def
                    .fields
                    .iter()
                    .map(|f| canonical_type(&f.ty, structs))
                    .collect();
                format!("({})", inner.join(","))
            }
            None => ty.abi_name().to_string(),
        },
        SemType::StaticArray { element, length } => {
            format!("{}[{}]", canonical_type(element, structs), length)
        }
        SemType::DynamicArray(element) => format!("{}[]", canonical_type(element, structs)),
        other => other.abi_name().to_string(),
    }
}

/// `name(type1,type2,...)`
pub fn signature(name: &str, types: &[SemType], structs: &dyn StructLookup) -> String {
    let params: Vec<String> = types.iter().map(|t| canonical_type(t, structs)).collect();
    format!("{}({})", name, params.join(","))
}

/// First four bytes of the signature hash
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Full 32-byte signature hash (event topic0)
pub fn topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// `0x`-prefixed lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Selector as a `u32` literal for dispatch tables
pub fn selector_u32(selector: [u8; 4]) -> u32 {
    u32::from_be_bytes(selector)
}
