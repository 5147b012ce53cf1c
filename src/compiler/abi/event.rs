//! Event ABI entries and emit helpers

use super::struct_encoding::{emit_encoder, word_writer, TuplePlan};
use super::{param, AbiEntry, EntryKind, StructLookup};
use crate::compiler::ir::{IrEvent, SemType, WORD_SIZE};
use crate::compiler::transform::{names, type_name};

/// ABI entry of an event
pub fn abi_entry(event: &IrEvent, structs: &dyn StructLookup) -> AbiEntry {
    let mut entry = AbiEntry::new(EntryKind::Event);
    entry.name = Some(event.name.clone());
    entry.anonymous = Some(false);
    entry.inputs = Some(
        event
            .fields
            .iter()
            .map(|f| {
                let mut p = param(&f.name, &f.ty, structs);
                p.indexed = Some(f.indexed);
                p
            })
            .collect(),
    );
    entry
}

/// Topic constant plus the `__emit_<Event>` helper
///
/// Topic 0 is the signature hash; each indexed field fills the next topic
/// (variable-length values are hashed). Non-indexed fields form the data.
pub fn emit_helper(event: &IrEvent, structs: &dyn StructLookup) -> Vec<String> {
    let topic_bytes: Vec<String> = event
        .topic0
        .iter()
        .map(|b| format!("0x{:02x}", b))
        .collect();
    let mut lines = vec![format!(
        "const {}: StaticArray<u8> = [{}];",
        names::topic_const(&event.name),
        topic_bytes.join(", ")
    )];

    let params: Vec<String> = event
        .fields
        .iter()
        .map(|f| format!("{}: {}", f.name, type_name(&f.ty)))
        .collect();
    lines.push(format!(
        "function {}({}): void {{",
        names::emit_event(&event.name),
        params.join(", ")
    ));

    let indexed: Vec<_> = event.fields.iter().filter(|f| f.indexed).collect();
    let topics = 1 + indexed.len() as u64;
    lines.push(format!("  const __topics = Abi.alloc({});", topics * WORD_SIZE));
    lines.push(format!(
        "  Abi.writeBytes32(__topics, 0, {});",
        names::topic_const(&event.name)
    ));
    for (i, field) in indexed.iter().enumerate() {
        let at = (i as u64 + 1) * WORD_SIZE;
        let line = match &field.ty {
            SemType::Str => format!("  Abi.writeTopicHash(__topics, {}, Str.bytes({}));", at, field.name),
            SemType::Struct(name) => format!(
                "  Abi.writeTopicHash(__topics, {}, {}({}));",
                at,
                names::struct_encode(name),
                field.name
            ),
            SemType::DynamicArray(_) | SemType::StaticArray { .. } => format!(
                "  Abi.writeTopicHash(__topics, {}, Abi.encodeArray({}));",
                at, field.name
            ),
            other => format!("  {}(__topics, {}, {});", word_writer(other), at, field.name),
        };
        lines.push(line);
    }

    let data: Vec<(String, _)> = event
        .fields
        .iter()
        .filter(|f| !f.indexed)
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect();
    let plan = TuplePlan::new(&data, structs);
    let values: Vec<String> = data.iter().map(|(name, _)| name.clone()).collect();
    lines.extend(
        emit_encoder(&plan, &values, "__data", 0, structs)
            .into_iter()
            .map(|l| format!("  {}", l)),
    );
    lines.push(format!(
        "  Log.emit(__topics, {}, __data, __data_size);",
        topics
    ));
    lines.push("}".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::abi::selector::topic;
    use crate::compiler::ir::{IrEventField, IrStruct};

    fn transfer() -> IrEvent {
        let field = |name: &str, ty: SemType, indexed: bool| IrEventField {
            name: name.into(),
            ty,
            indexed,
        };
        IrEvent {
            name: "Transfer".into(),
            fields: vec![
                field("from", SemType::Address, true),
                field("to", SemType::Address, true),
                field("value", SemType::U256, false),
            ],
            topic0: topic("Transfer(address,address,uint256)"),
        }
    }

    #[test]
    fn test_helper_writes_topics_then_data() {
        let lines = emit_helper(&transfer(), &Vec::<IrStruct>::new());
        assert!(lines[0].starts_with("const TOPIC_Transfer: StaticArray<u8> = [0xdd, 0xf2, 0x52,"));
        assert_eq!(
            lines[1],
            "function __emit_Transfer(from: Address, to: Address, value: U256): void {"
        );
        assert!(lines.contains(&"  const __topics = Abi.alloc(96);".to_string()));
        assert!(lines.contains(&"  Abi.writeAddress(__topics, 32, from);".to_string()));
        assert!(lines.contains(&"  Abi.writeAddress(__topics, 64, to);".to_string()));
        assert!(lines.contains(&"  Abi.writeU256(__data, 0, value);".to_string()));
        assert!(lines.contains(&"  Log.emit(__topics, 3, __data, __data_size);".to_string()));
    }

    #[test]
    fn test_abi_entry_marks_indexed() {
        let entry = abi_entry(&transfer(), &Vec::<IrStruct>::new());
        let inputs = entry.inputs.unwrap();
        assert_eq!(inputs[0].indexed, Some(true));
        assert_eq!(inputs[2].indexed, Some(false));
        assert_eq!(entry.anonymous, Some(false));
    }
}
