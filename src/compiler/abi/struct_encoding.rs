//! Head/tail ABI encoding of tuples and structs
//!
//! Static members are written inline into the head: scalars take one word,
//! static structs and fixed arrays of static elements take one word per
//! contained scalar. Dynamic members (text, `T[]`, structs or fixed arrays
//! holding either) take one head word holding a relative offset; their
//! contents go to the tail in member order. A dynamic value encoded on its
//! own is a one-member tuple, so its contents start after a 32-byte offset
//! word.

use super::selector::StructLookup;
use crate::compiler::ir::{IrStruct, SemType, WORD_SIZE};
use crate::compiler::transform::names;

/// Nesting depth after which struct recursion stops (cyclic structs are
/// reported during analysis but may still reach emission in best-effort mode)
const MAX_NESTING: usize = 16;

/// Placement of one tuple member
#[derive(Debug, Clone, PartialEq)]
pub struct TupleField {
    /// Member name
    pub name: String,
    /// Member type
    pub ty: SemType,
    /// Byte offset of the head slot, relative to the tuple start
    pub head_offset: u64,
    /// Bytes the member occupies in the head
    pub width: u64,
    /// Whether the contents live in the tail
    pub tail: bool,
}

/// Encoding plan of an ordered member list
#[derive(Debug, Clone, PartialEq)]
pub struct TuplePlan {
    /// Members in order
    pub fields: Vec<TupleField>,
    /// Sum of the member widths
    pub head_size: u64,
    /// At least one member lives in the tail
    pub dynamic: bool,
}

impl TuplePlan {
    /// Plans an ordered member list
    pub fn new(fields: &[(String, SemType)], structs: &dyn StructLookup) -> Self {
        let mut head_offset = 0;
        let planned: Vec<TupleField> = fields
            .iter()
            .map(|(name, ty)| {
                let tail = is_abi_dynamic(ty, structs);
                let width = head_width(ty, structs);
                let field = TupleField {
                    name: name.clone(),
                    ty: ty.clone(),
                    head_offset,
                    width,
                    tail,
                };
                head_offset += width;
                field
            })
            .collect();
        TuplePlan {
            head_size: head_offset,
            dynamic: planned.iter().any(|f| f.tail),
            fields: planned,
        }
    }

    /// Plans the fields of a struct in declaration order
    pub fn for_struct(def: &IrStruct, structs: &dyn StructLookup) -> Self {
        let members: Vec<(String, SemType)> = def
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.ty.clone()))
            .collect();
        Self::new(&members, structs)
    }
}

/// Whether `ty` is encoded behind an offset word
pub fn is_abi_dynamic(ty: &SemType, structs: &dyn StructLookup) -> bool {
    dynamic_within(ty, structs, 0)
}

fn dynamic_within(ty: &SemType, structs: &dyn StructLookup, depth: usize) -> bool {
    if depth > MAX_NESTING {
        return false;
    }
    match ty {
        SemType::Str | SemType::DynamicArray(_) => true,
        SemType::StaticArray { element, .. } => dynamic_within(element, structs, depth + 1),
        SemType::Struct(name) => structs.lookup_struct(name).is_some_and(|def| {
            def.fields
                .iter()
                .any(|f| dynamic_within(&f.ty, structs, depth + 1))
        }),
        _ => false,
    }
}

/// Bytes `ty` occupies in the head of an enclosing tuple
pub fn head_width(ty: &SemType, structs: &dyn StructLookup) -> u64 {
    width_within(ty, structs, 0)
}

fn width_within(ty: &SemType, structs: &dyn StructLookup, depth: usize) -> u64 {
    if depth > MAX_NESTING || dynamic_within(ty, structs, depth) {
        return WORD_SIZE;
    }
    match ty {
        SemType::StaticArray { element, length } => {
            length * width_within(element, structs, depth + 1)
        }
        SemType::Struct(name) => structs
            .lookup_struct(name)
            .map(|def| {
                def.fields
                    .iter()
                    .map(|f| width_within(&f.ty, structs, depth + 1))
                    .sum()
            })
            .unwrap_or(WORD_SIZE),
        _ => WORD_SIZE,
    }
}

/// Runtime writer of a head-word value
pub fn word_writer(ty: &SemType) -> &'static str {
    match ty {
        SemType::I256 => "Abi.writeI256",
        SemType::Address | SemType::Interface(_) => "Abi.writeAddress",
        SemType::Bool => "Abi.writeBool",
        _ => "Abi.writeU256",
    }
}

/// Runtime reader of a head-word value
pub fn word_reader(ty: &SemType) -> &'static str {
    match ty {
        SemType::I256 => "Abi.decodeI256",
        SemType::Address | SemType::Interface(_) => "Abi.decodeAddress",
        SemType::Bool => "Abi.decodeBool",
        _ => "Abi.decodeU256",
    }
}

/// Emits lines that encode `values` (one per member) into a fresh buffer
/// named `out`
///
/// `prefix` reserves leading bytes (e.g. an error selector). The buffer size
/// ends up in `<out>_size`.
pub fn emit_encoder(
    plan: &TuplePlan,
    values: &[String],
    out: &str,
    prefix: u64,
    structs: &dyn StructLookup,
) -> Vec<String> {
    let tail = format!("{}_tail", out);
    let mut lines = vec![format!("let {}: u32 = {};", tail, plan.head_size)];

    let mut tails = Vec::new();
    for (field, value) in plan.fields.iter().zip(values) {
        if !field.tail {
            continue;
        }
        let var = format!("{}_{}", out, field.name);
        match &field.ty {
            SemType::Str => {
                lines.push(format!("const {}_len: u32 = Str.byteLength({});", var, value));
                lines.push(format!("const {}_padded: u32 = Abi.padded({}_len);", var, var));
            }
            SemType::DynamicArray(_) => {
                lines.push(format!("const {}_len: u32 = <u32>{}.length;", var, value));
                lines.push(format!("const {}_padded: u32 = {}_len * 32;", var, var));
            }
            SemType::Struct(name) => {
                lines.push(format!("const {}_enc = {}({});", var, names::struct_encode(name), value));
                lines.push(format!("const {}_len: u32 = Abi.byteLength({}_enc);", var, var));
                lines.push(format!("const {}_padded: u32 = Abi.padded({}_len);", var, var));
            }
            _ => {
                lines.push(format!("const {}_enc = Abi.encodeArray({});", var, value));
                lines.push(format!("const {}_len: u32 = Abi.byteLength({}_enc);", var, var));
                lines.push(format!("const {}_padded: u32 = Abi.padded({}_len);", var, var));
            }
        }
        lines.push(format!("const {}_offset: u32 = {};", var, tail));
        let length_word = if matches!(field.ty, SemType::Str | SemType::DynamicArray(_)) {
            "32 + "
        } else {
            ""
        };
        lines.push(format!("{} += {}{}_padded;", tail, length_word, var));
        tails.push((field, value, var));
    }

    lines.push(format!("const {}_size: u32 = {} + {};", out, prefix, tail));
    lines.push(format!("const {} = Abi.alloc({}_size);", out, out));
    for (field, value) in plan.fields.iter().zip(values) {
        let at = (prefix + field.head_offset).to_string();
        if field.tail {
            let var = format!("{}_{}", out, field.name);
            lines.push(format!("Abi.writeWord({}, {}, {}_offset);", out, at, var));
        } else {
            write_inline(&field.ty, out, &at, value, structs, 0, &mut lines);
        }
    }
    for (field, value, var) in tails {
        let at = format!("{} + {}_offset", prefix, var);
        let line = match &field.ty {
            SemType::Str => format!("Abi.writeStr({}, {}, {});", out, at, value),
            SemType::DynamicArray(element) => format!(
                "Abi.writeArray<{}>({}, {}, {});",
                element.runtime_name(),
                out,
                at,
                value
            ),
            _ => format!("Abi.writeRaw({}, {}, {}_enc);", out, at, var),
        };
        lines.push(line);
    }
    lines
}

/// Writes a static value in place; fixed arrays loop over their elements
fn write_inline(
    ty: &SemType,
    out: &str,
    at: &str,
    value: &str,
    structs: &dyn StructLookup,
    depth: usize,
    lines: &mut Vec<String>,
) {
    match ty {
        SemType::Struct(name) => lines.push(format!(
            "Abi.writeRaw({}, {}, {}({}));",
            out,
            at,
            names::struct_encode(name),
            value
        )),
        SemType::StaticArray { element, length } if depth < MAX_NESTING => {
            let i = format!("__i{}", depth);
            let width = head_width(element, structs);
            lines.push(format!(
                "for (let {i}: u32 = 0; {i} < {}; {i}++) {{",
                length,
                i = i
            ));
            let mut body = Vec::new();
            write_inline(
                element,
                out,
                &format!("{} + {} * {}", at, i, width),
                &format!("{}[{}]", value, i),
                structs,
                depth + 1,
                &mut body,
            );
            lines.extend(body.into_iter().map(|l| format!("  {}", l)));
            lines.push("}".to_string());
        }
        other => lines.push(format!("{}({}, {}, {});", word_writer(other), out, at, value)),
    }
}

/// Emits lines decoding every member from `input`
///
/// `base` is the byte position the tuple's relative offsets count from and
/// the position of its first head slot. Returns the lines and the variable
/// holding each member.
pub fn emit_decoder(
    plan: &TuplePlan,
    input: &str,
    base: &str,
    prefix: &str,
    structs: &dyn StructLookup,
) -> (Vec<String>, Vec<String>) {
    let mut lines = Vec::with_capacity(plan.fields.len());
    let mut vars = Vec::with_capacity(plan.fields.len());
    for field in &plan.fields {
        let var = format!("{}{}", prefix, field.name);
        let at = format!("{} + {}", base, field.head_offset);
        if field.tail {
            let value = match &field.ty {
                SemType::Str => format!("Abi.decodeStr({}, {}, {})", input, base, at),
                SemType::Struct(name) => {
                    format!("{}({}, {}, {})", names::struct_decode(name), input, base, at)
                }
                other => format!(
                    "Abi.decodeArray<{}>({}, {}, {})",
                    other.array_element().map(SemType::runtime_name).unwrap_or_default(),
                    input,
                    base,
                    at
                ),
            };
            lines.push(format!("const {} = {};", var, value));
        } else {
            read_inline(&field.ty, input, base, &at, &var, structs, 0, &mut lines);
        }
        vars.push(var);
    }
    (lines, vars)
}

/// Declares `var` holding the static value at `at`
#[allow(clippy::too_many_arguments)]
fn read_inline(
    ty: &SemType,
    input: &str,
    base: &str,
    at: &str,
    var: &str,
    structs: &dyn StructLookup,
    depth: usize,
    lines: &mut Vec<String>,
) {
    match ty {
        SemType::Struct(name) => lines.push(format!(
            "const {} = {}({}, {}, {});",
            var,
            names::struct_decode(name),
            input,
            base,
            at
        )),
        SemType::StaticArray { element, length } if depth < MAX_NESTING => {
            let i = format!("__i{}", depth);
            let width = head_width(element, structs);
            lines.push(format!(
                "const {} = new Array<{}>({});",
                var,
                element.runtime_name(),
                length
            ));
            lines.push(format!(
                "for (let {i}: u32 = 0; {i} < {}; {i}++) {{",
                length,
                i = i
            ));
            let item = format!("{}_e{}", var, depth);
            let mut body = Vec::new();
            read_inline(
                element,
                input,
                base,
                &format!("{} + {} * {}", at, i, width),
                &item,
                structs,
                depth + 1,
                &mut body,
            );
            body.push(format!("{}[{}] = {};", var, i, item));
            lines.extend(body.into_iter().map(|l| format!("  {}", l)));
            lines.push("}".to_string());
        }
        other => lines.push(format!(
            "const {} = {}({}, {});",
            var,
            word_reader(other),
            input,
            at
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::layout::compute_layout;

    fn position() -> IrStruct {
        compute_layout(
            "Position",
            &[
                ("owner".to_string(), SemType::Address),
                ("label".to_string(), SemType::Str),
                ("amount".to_string(), SemType::U256),
            ],
        )
    }

    fn point() -> IrStruct {
        compute_layout(
            "Point",
            &[
                ("x".to_string(), SemType::U256),
                ("y".to_string(), SemType::U256),
            ],
        )
    }

    fn structs() -> Vec<IrStruct> {
        vec![position(), point()]
    }

    #[test]
    fn test_plan_matches_layout() {
        let plan = TuplePlan::for_struct(&position(), &structs());
        assert_eq!(plan.head_size, 96);
        assert!(plan.dynamic);
        let offsets: Vec<u64> = plan.fields.iter().map(|f| f.head_offset).collect();
        assert_eq!(offsets, vec![0, 32, 64]);
    }

    #[test]
    fn test_static_members_are_inline() {
        let structs = structs();
        let array = SemType::StaticArray {
            element: Box::new(SemType::U256),
            length: 3,
        };
        let plan = TuplePlan::new(
            &[
                ("p".to_string(), SemType::Struct("Point".into())),
                ("xs".to_string(), array),
                ("who".to_string(), SemType::Address),
                ("pos".to_string(), SemType::Struct("Position".into())),
            ],
            &structs,
        );
        let placed: Vec<(u64, u64, bool)> = plan
            .fields
            .iter()
            .map(|f| (f.head_offset, f.width, f.tail))
            .collect();
        assert_eq!(
            placed,
            vec![(0, 64, false), (64, 96, false), (160, 32, false), (192, 32, true)]
        );
        assert_eq!(plan.head_size, 224);
    }

    #[test]
    fn test_fixed_array_of_text_is_dynamic() {
        let texts = SemType::StaticArray {
            element: Box::new(SemType::Str),
            length: 2,
        };
        assert!(is_abi_dynamic(&texts, &structs()));
        assert_eq!(head_width(&texts, &structs()), 32);
        assert!(!is_abi_dynamic(&SemType::Struct("Point".into()), &structs()));
    }

    #[test]
    fn test_dynamic_struct_alone_follows_offset_word() {
        let structs = structs();
        let plan = TuplePlan::new(&[("ret".to_string(), SemType::Struct("Position".into()))], &structs);
        let lines = emit_encoder(&plan, &["r".to_string()], "__out", 0, &structs);
        assert!(lines.contains(&"let __out_tail: u32 = 32;".to_string()));
        assert!(lines.contains(&"const __out_ret_offset: u32 = __out_tail;".to_string()));
        assert!(lines.contains(&"Abi.writeWord(__out, 0, __out_ret_offset);".to_string()));
        assert!(lines.contains(&"Abi.writeRaw(__out, 0 + __out_ret_offset, __out_ret_enc);".to_string()));
    }

    #[test]
    fn test_text_tail_follows_head() {
        let structs = structs();
        let plan = TuplePlan::for_struct(&position(), &structs);
        let values = vec!["o".to_string(), "l".to_string(), "a".to_string()];
        let lines = emit_encoder(&plan, &values, "__enc", 0, &structs);
        assert_eq!(lines[0], "let __enc_tail: u32 = 96;");
        assert!(lines.contains(&"__enc_tail += 32 + __enc_label_padded;".to_string()));
        assert!(lines.contains(&"Abi.writeAddress(__enc, 0, o);".to_string()));
        assert!(lines.contains(&"Abi.writeWord(__enc, 32, __enc_label_offset);".to_string()));
        assert!(lines.contains(&"Abi.writeU256(__enc, 64, a);".to_string()));
        assert!(lines.contains(&"Abi.writeStr(__enc, 0 + __enc_label_offset, l);".to_string()));
    }

    #[test]
    fn test_fixed_array_written_in_place() {
        let structs = structs();
        let array = SemType::StaticArray {
            element: Box::new(SemType::Struct("Point".into())),
            length: 2,
        };
        let plan = TuplePlan::new(&[("ps".to_string(), array)], &structs);
        let lines = emit_encoder(&plan, &["ps".to_string()], "__cd", 4, &structs);
        assert!(lines.contains(&"for (let __i0: u32 = 0; __i0 < 2; __i0++) {".to_string()));
        assert!(lines.contains(&"  Abi.writeRaw(__cd, 4 + __i0 * 64, Point_encode(ps[__i0]));".to_string()));
        assert!(lines.contains(&"const __cd_size: u32 = 4 + __cd_tail;".to_string()));
    }

    #[test]
    fn test_decoder_reads_each_member() {
        let structs = structs();
        let plan = TuplePlan::new(
            &[
                ("origin".to_string(), SemType::Struct("Point".into())),
                ("to".to_string(), SemType::Address),
                ("amount".to_string(), SemType::U256),
            ],
            &structs,
        );
        let (lines, vars) = emit_decoder(&plan, "input", "4", "", &structs);
        assert_eq!(vars, vec!["origin".to_string(), "to".to_string(), "amount".to_string()]);
        assert_eq!(lines[0], "const origin = Point_decode(input, 4, 4 + 0);");
        assert_eq!(lines[1], "const to = Abi.decodeAddress(input, 4 + 64);");
        assert_eq!(lines[2], "const amount = Abi.decodeU256(input, 4 + 96);");
    }

    #[test]
    fn test_decoder_fills_fixed_array() {
        let structs = structs();
        let array = SemType::StaticArray {
            element: Box::new(SemType::U256),
            length: 4,
        };
        let plan = TuplePlan::new(&[("xs".to_string(), array)], &structs);
        let (lines, _) = emit_decoder(&plan, "input", "4", "", &structs);
        assert_eq!(
            lines,
            vec![
                "const xs = new Array<U256>(4);".to_string(),
                "for (let __i0: u32 = 0; __i0 < 4; __i0++) {".to_string(),
                "  const xs_e0 = Abi.decodeU256(input, 4 + 0 + __i0 * 32);".to_string(),
                "  xs[__i0] = xs_e0;".to_string(),
                "}".to_string(),
            ]
        );
    }
}
