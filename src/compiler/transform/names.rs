//! Generated helper names shared by the transformers and the emitter

/// `SLOT_<name>` constant
pub fn slot_const(var: &str) -> String {
    format!("SLOT_{}", var)
}

/// Storage read accessor
pub fn load(var: &str) -> String {
    format!("load_{}", var)
}

/// Storage write accessor
pub fn store(var: &str) -> String {
    format!("store_{}", var)
}

/// Storage array length accessor
pub fn length(var: &str) -> String {
    format!("length_{}", var)
}

/// Storage dynamic-array append
pub fn push(var: &str) -> String {
    format!("push_{}", var)
}

/// Read accessor for one field of a storage struct
pub fn load_field(var: &str, field: &str) -> String {
    format!("load_{}_{}", var, field)
}

/// Write accessor for one field of a storage struct
pub fn store_field(var: &str, field: &str) -> String {
    format!("store_{}_{}", var, field)
}

/// Allocates a zeroed struct in memory
pub fn struct_alloc(name: &str) -> String {
    format!("{}_alloc", name)
}

/// Builds a struct from field values
pub fn struct_create(name: &str) -> String {
    format!("{}_create", name)
}

/// Memory field getter
pub fn struct_get(name: &str, field: &str) -> String {
    format!("{}_get_{}", name, field)
}

/// Memory field setter
pub fn struct_set(name: &str, field: &str) -> String {
    format!("{}_set_{}", name, field)
}

/// ABI encoder of a struct value
pub fn struct_encode(name: &str) -> String {
    format!("{}_encode", name)
}

/// ABI decoder of a struct argument
pub fn struct_decode(name: &str) -> String {
    format!("{}_decode", name)
}

/// Event emitter
pub fn emit_event(event: &str) -> String {
    format!("__emit_{}", event)
}

/// `TOPIC_<event>` constant
pub fn topic_const(event: &str) -> String {
    format!("TOPIC_{}", event)
}

/// Custom error revert helper
pub fn revert_error(error: &str) -> String {
    format!("__revert_{}", error)
}

/// Cross-contract call stub
pub fn interface_call(interface: &str, method: &str) -> String {
    format!("__call_{}_{}", interface, method)
}

/// Exported ABI wrapper of a method
pub fn entry(method: &str) -> String {
    format!("__entry_{}", method)
}

/// Storage key of the deploy guard
pub const INITIALIZED_SLOT: &str = "__INITIALIZED_SLOT";
