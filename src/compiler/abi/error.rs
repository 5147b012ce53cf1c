//! Custom error ABI entries and revert helpers

use super::struct_encoding::{emit_encoder, TuplePlan};
use super::{param, AbiEntry, EntryKind, StructLookup};
use crate::compiler::ir::IrErrorDecl;
use crate::compiler::transform::{names, type_name};

/// Bytes taken by the selector in front of the encoded fields
pub const SELECTOR_SIZE: u64 = 4;

/// ABI entry of a custom error
pub fn abi_entry(error: &IrErrorDecl, structs: &dyn StructLookup) -> AbiEntry {
    let mut entry = AbiEntry::new(EntryKind::Error);
    entry.name = Some(error.name.clone());
    entry.inputs = Some(
        error
            .fields
            .iter()
            .map(|f| param(&f.name, &f.ty, structs))
            .collect(),
    );
    entry
}

/// `__revert_<Error>`: selector, then the fields as one tuple, then abort
pub fn emit_helper(error: &IrErrorDecl, structs: &dyn StructLookup) -> Vec<String> {
    let params: Vec<String> = error
        .fields
        .iter()
        .map(|f| format!("{}: {}", f.name, type_name(&f.ty)))
        .collect();
    let mut lines = vec![format!(
        "function {}({}): void {{",
        names::revert_error(&error.name),
        params.join(", ")
    )];

    let members: Vec<_> = error
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect();
    let plan = TuplePlan::new(&members, structs);
    let values: Vec<String> = members.iter().map(|(name, _)| name.clone()).collect();
    lines.extend(
        emit_encoder(&plan, &values, "__err", SELECTOR_SIZE, structs)
            .into_iter()
            .map(|l| format!("  {}", l)),
    );
    for (i, byte) in error.selector.iter().enumerate() {
        lines.push(format!("  store<u8>(__err + {}, 0x{:02x});", i, byte));
    }
    lines.push("  Host.revert(__err, __err_size);".to_string());
    lines.push("}".to_string());
    lines
}
