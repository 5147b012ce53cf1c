//! ABI description, selectors and value encoders
//!
//! [`generate`] builds the JSON interface document of a contract; the
//! submodules compute selectors and topics and emit the encoding helpers used
//! by the generated source.

pub mod error;
pub mod event;
pub mod selector;
pub mod struct_encoding;

pub use selector::{
    canonical_type, keccak256, selector, selector_u32, signature, to_hex, topic, StructLookup,
};

use serde::{Deserialize, Serialize};

use crate::compiler::ir::{IrContract, MethodRole, SemType, StateMutability};
use crate::error::{Error, Result};

/// Kind of an ABI entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Callable method
    Function,
    /// Deploy-time constructor
    Constructor,
    /// Catch-all method
    Fallback,
    /// Plain value transfer
    Receive,
    /// Log record
    Event,
    /// Custom revert reason
    Error,
}

/// One parameter of an ABI entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name (empty for unnamed outputs)
    pub name: String,
    /// Canonical type (`tuple` for structs)
    #[serde(rename = "type")]
    pub ty: String,
    /// Event fields only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    /// Tuple members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

/// One entry of the ABI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiEntry {
    /// Entry kind
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Method, event or error name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mutability of functions, constructors, fallback and receive
    #[serde(
        rename = "stateMutability",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<String>,
    /// Inputs (fields for events and errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<AbiParam>>,
    /// Function outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<AbiParam>>,
    /// Events only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
}

impl AbiEntry {
    fn new(kind: EntryKind) -> Self {
        AbiEntry {
            kind,
            name: None,
            state_mutability: None,
            inputs: None,
            outputs: None,
            anonymous: None,
        }
    }
}

/// ABI parameter for `ty`; structs become `tuple` with components
pub fn param(name: &str, ty: &SemType, structs: &dyn StructLookup) -> AbiParam {
    let (suffix, base) = array_suffix(ty);
    let (ty_name, components) = match base {
        SemType::Struct(struct_name) => match structs.lookup_struct(struct_name) {
            Some(def) => (
                format!("tuple{}", suffix),
                def.fields
                    .iter()
                    .map(|f| param(&f.name, &f.ty, structs))
                    .collect(),
            ),
            None => (canonical_type(ty, structs), Vec::new()),
        },
        _ => (canonical_type(ty, structs), Vec::new()),
    };
    AbiParam {
        name: name.to_string(),
        ty: ty_name,
        indexed: None,
        components,
    }
}

/// Array dimensions of `ty` (`[]`, `[3][]`, ...) and the innermost element
fn array_suffix(ty: &SemType) -> (String, &SemType) {
    match ty {
        SemType::DynamicArray(element) => {
            let (inner, base) = array_suffix(element);
            (format!("{}[]", inner), base)
        }
        SemType::StaticArray { element, length } => {
            let (inner, base) = array_suffix(element);
            (format!("{}[{}]", inner, length), base)
        }
        other => (String::new(), other),
    }
}

/// Builds the ABI document of `contract`
///
/// Order: constructor, functions (inherited first, overrides in place),
/// fallback/receive, then events and errors when requested.
pub fn generate(contract: &IrContract, include_events_and_errors: bool) -> Vec<AbiEntry> {
    let mut entries = Vec::new();

    // Without a declared constructor, deploy still exists: no inputs, no value
    let ctor = contract.effective_constructor();
    let mut entry = AbiEntry::new(EntryKind::Constructor);
    let mutability = if ctor.is_some_and(|c| c.payable) {
        StateMutability::Payable
    } else {
        StateMutability::Nonpayable
    };
    entry.state_mutability = Some(mutability.as_str().to_string());
    entry.inputs = Some(
        ctor.map(|c| {
            c.inputs
                .iter()
                .map(|p| param(&p.name, &p.ty, contract))
                .collect()
        })
        .unwrap_or_default(),
    );
    entries.push(entry);

    let mut special = Vec::new();
    for method in contract.exported_methods() {
        match method.role {
            MethodRole::Regular => {
                let mut entry = AbiEntry::new(EntryKind::Function);
                entry.name = Some(method.name.clone());
                entry.state_mutability = Some(method.mutability.as_str().to_string());
                entry.inputs = Some(
                    method
                        .inputs
                        .iter()
                        .map(|p| param(&p.name, &p.ty, contract))
                        .collect(),
                );
                entry.outputs = Some(
                    method
                        .output
                        .iter()
                        .map(|ty| param("", ty, contract))
                        .collect(),
                );
                entries.push(entry);
            }
            MethodRole::Fallback => {
                let mut entry = AbiEntry::new(EntryKind::Fallback);
                entry.state_mutability = Some(method.mutability.as_str().to_string());
                special.push(entry);
            }
            MethodRole::Receive => {
                let mut entry = AbiEntry::new(EntryKind::Receive);
                entry.state_mutability = Some(StateMutability::Payable.as_str().to_string());
                special.push(entry);
            }
        }
    }
    entries.extend(special);

    if include_events_and_errors {
        for decl in contract.all_events() {
            entries.push(event::abi_entry(decl, contract));
        }
        for decl in contract.all_errors() {
            entries.push(error::abi_entry(decl, contract));
        }
    }
    entries
}

/// Renders the ABI document as pretty-printed JSON
pub fn to_json(entries: &[AbiEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| Error::compiler(format!("ABI serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::{IrConstructor, IrMethod, IrParam, Visibility};
    use crate::compiler::layout::compute_layout;

    fn method(name: &str, visibility: Visibility, role: MethodRole) -> IrMethod {
        IrMethod {
            name: name.into(),
            visibility,
            mutability: StateMutability::View,
            role,
            inputs: vec![IrParam {
                name: "who".into(),
                ty: SemType::Address,
            }],
            output: Some(SemType::U256),
            body: vec![],
        }
    }

    fn contract() -> IrContract {
        IrContract {
            name: "Token".into(),
            path: "token.ts".into(),
            parent: None,
            storage: vec![],
            methods: vec![
                method("balanceOf", Visibility::External, MethodRole::Regular),
                method("helper", Visibility::Internal, MethodRole::Regular),
            ],
            constructor: Some(IrConstructor {
                inputs: vec![],
                body: vec![],
                payable: false,
            }),
            structs: vec![compute_layout(
                "Pair",
                &[
                    ("a".to_string(), SemType::U256),
                    ("b".to_string(), SemType::Str),
                ],
            )],
            events: vec![],
            errors: vec![],
            interfaces: vec![],
        }
    }

    #[test]
    fn test_function_and_constructor_entries() {
        let entries = generate(&contract(), false);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Constructor);
        assert_eq!(entries[1].name.as_deref(), Some("balanceOf"));
        assert_eq!(entries[1].state_mutability.as_deref(), Some("view"));

        let json: serde_json::Value = serde_json::from_str(&to_json(&entries).unwrap()).unwrap();
        assert_eq!(json[1]["type"], "function");
        assert_eq!(json[1]["inputs"][0]["type"], "address");
        assert_eq!(json[1]["outputs"][0]["type"], "uint256");
        assert!(json[0].get("outputs").is_none());
    }

    #[test]
    fn test_constructor_entry_always_present() {
        let mut c = contract();
        c.constructor = None;
        let entries = generate(&c, false);
        assert_eq!(entries[0].kind, EntryKind::Constructor);
        assert_eq!(entries[0].inputs.as_ref().map(|i| i.len()), Some(0));
        assert_eq!(entries[0].state_mutability.as_deref(), Some("nonpayable"));

        c.constructor = Some(IrConstructor {
            inputs: vec![],
            body: vec![],
            payable: true,
        });
        let entries = generate(&c, false);
        assert_eq!(entries[0].state_mutability.as_deref(), Some("payable"));
    }

    #[test]
    fn test_struct_param_is_tuple() {
        let c = contract();
        let p = param(
            "pairs",
            &SemType::DynamicArray(Box::new(SemType::Struct("Pair".into()))),
            &c,
        );
        assert_eq!(p.ty, "tuple[]");
        assert_eq!(p.components.len(), 2);
        assert_eq!(p.components[1].ty, "string");
    }
}
