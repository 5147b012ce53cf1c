//! Struct memory layout
//!
//! Fields are laid out in declaration order, one 32-byte word each. Text and
//! dynamic-array fields are flagged dynamic; their word holds a pointer.

use std::collections::{HashMap, HashSet};

use super::ir::{IrStruct, IrStructField, SemType, WORD_SIZE};

/// Computes offsets, sizes and the dynamic flag for an ordered field list
pub fn compute_layout(name: &str, fields: &[(String, SemType)]) -> IrStruct {
    let mut offset = 0;
    let mut laid_out = Vec::with_capacity(fields.len());

    for (field_name, ty) in fields {
        let size = WORD_SIZE;
        laid_out.push(IrStructField {
            name: field_name.clone(),
            ty: ty.clone(),
            offset,
            size,
            dynamic: ty.is_dynamic(),
        });
        offset += size;
    }

    let dynamic = laid_out.iter().any(|f| f.dynamic);
    IrStruct {
        name: name.to_string(),
        fields: laid_out,
        total_size: offset,
        dynamic,
        alignment: WORD_SIZE,
    }
}

/// First field whose type is the struct itself
pub fn self_reference<'a>(name: &str, fields: &'a [(String, SemType)]) -> Option<&'a str> {
    fields
        .iter()
        .find(|(_, ty)| contains_struct(ty, name))
        .map(|(field, _)| field.as_str())
}

fn contains_struct(ty: &SemType, target: &str) -> bool {
    match ty {
        SemType::Struct(n) => n == target,
        SemType::StaticArray { element, .. } | SemType::DynamicArray(element) => {
            contains_struct(element, target)
        }
        _ => false,
    }
}

fn struct_deps(fields: &[(String, SemType)]) -> Vec<String> {
    fn collect(ty: &SemType, out: &mut Vec<String>) {
        match ty {
            SemType::Struct(n) => out.push(n.clone()),
            SemType::StaticArray { element, .. } | SemType::DynamicArray(element) => {
                collect(element, out)
            }
            _ => {}
        }
    }
    let mut deps = Vec::new();
    for (_, ty) in fields {
        collect(ty, &mut deps);
    }
    deps
}

/// Finds cycles of length >= 2 among struct definitions
///
/// Each cycle is returned once, as the path of struct names starting at the
/// alphabetically first member, e.g. `["A", "B", "A"]`. Direct
/// self-references are left to [`self_reference`].
pub fn find_cycles(defs: &HashMap<String, Vec<(String, SemType)>>) -> Vec<Vec<String>> {
    let mut names: Vec<&String> = defs.keys().collect();
    names.sort();

    let mut cycles = Vec::new();
    let mut reported: HashSet<Vec<String>> = HashSet::new();

    for start in names {
        let mut path = vec![start.clone()];
        walk(start, start, defs, &mut path, &mut cycles, &mut reported);
    }
    cycles
}

fn walk(
    start: &str,
    current: &str,
    defs: &HashMap<String, Vec<(String, SemType)>>,
    path: &mut Vec<String>,
    cycles: &mut Vec<Vec<String>>,
    reported: &mut HashSet<Vec<String>>,
) {
    let Some(fields) = defs.get(current) else {
        return;
    };
    for dep in struct_deps(fields) {
        if dep == current {
            continue;
        }
        if dep == start && path.len() > 1 {
            let mut members: Vec<String> = path.clone();
            members.sort();
            if reported.insert(members) {
                let mut cycle = path.clone();
                cycle.push(start.to_string());
                cycles.push(cycle);
            }
        } else if !path.contains(&dep) && dep.as_str() > start {
            path.push(dep.clone());
            walk(start, &dep, defs, path, cycles, reported);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(list: &[(&str, SemType)]) -> Vec<(String, SemType)> {
        list.iter()
            .map(|(n, t)| (n.to_string(), t.clone()))
            .collect()
    }

    #[test]
    fn test_address_text_uint_layout() {
        let layout = compute_layout(
            "Position",
            &fields(&[
                ("owner", SemType::Address),
                ("label", SemType::Str),
                ("amount", SemType::U256),
            ]),
        );
        let offsets: Vec<u64> = layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 32, 64]);
        assert_eq!(layout.total_size, 96);
        assert!(layout.dynamic);
        assert_eq!(layout.alignment, 32);
        assert!(layout.fields[1].dynamic);
        assert!(!layout.fields[0].dynamic);
    }

    #[test]
    fn test_static_struct_not_dynamic() {
        let layout = compute_layout(
            "Pair",
            &fields(&[("a", SemType::U256), ("b", SemType::Bool)]),
        );
        assert!(!layout.dynamic);
        assert_eq!(layout.total_size, 64);
    }

    #[test]
    fn test_self_reference_detected() {
        let node = fields(&[
            ("value", SemType::U256),
            ("next", SemType::Struct("Node".into())),
        ]);
        assert_eq!(self_reference("Node", &node), Some("next"));
    }

    #[test]
    fn test_indirect_cycle_detected_once() {
        let mut defs = HashMap::new();
        defs.insert("A".to_string(), fields(&[("b", SemType::Struct("B".into()))]));
        defs.insert("B".to_string(), fields(&[("a", SemType::Struct("A".into()))]));
        defs.insert("C".to_string(), fields(&[("x", SemType::U256)]));

        let cycles = find_cycles(&defs);
        assert_eq!(cycles, vec![vec!["A".to_string(), "B".into(), "A".into()]]);
    }
}
