//! Literal lowering

use super::{EmitContext, EmitResult};
use crate::compiler::ir::{Literal, SemType};

/// Writes `text` into freshly allocated memory
///
/// Returns the setup lines, the pointer temporary and the byte length.
pub fn string_bytes(text: &str, ctx: &mut EmitContext) -> (Vec<String>, String, usize) {
    let bytes = text.as_bytes();
    let ptr = ctx.temp("s");
    let mut lines = Vec::with_capacity(bytes.len() + 1);
    lines.push(format!("const {} = malloc({});", ptr, bytes.len()));
    for (i, b) in bytes.iter().enumerate() {
        lines.push(format!("store<u8>({} + {}, {});", ptr, i, b));
    }
    (lines, ptr, bytes.len())
}

pub(super) fn lower(lit: &Literal, ty: &SemType, ctx: &mut EmitContext) -> EmitResult {
    match lit {
        Literal::Bool(b) => EmitResult::value(b.to_string(), SemType::Bool),
        Literal::Str(text) if text.is_empty() => EmitResult::value("Str.create()", SemType::Str),
        Literal::Str(text) => {
            let (setup, ptr, len) = string_bytes(text, ctx);
            EmitResult::with_setup(setup, format!("Str.fromBytes({}, {})", ptr, len), SemType::Str)
        }
        Literal::Int(text) => int(text, ty, ctx),
    }
}

/// Small literals use the native constructors; anything wider goes through
/// the decimal parser
fn int(text: &str, ty: &SemType, ctx: &mut EmitContext) -> EmitResult {
    let prefix = if ty.is_signed() { "I256" } else { "U256" };
    let native = if ty.is_signed() {
        text.parse::<i64>()
            .ok()
            .map(|v| format!("I256.fromI64({})", v))
    } else {
        text.parse::<u64>()
            .ok()
            .map(|v| format!("U256.fromU64({})", v))
    };
    if let Some(value) = native {
        return EmitResult::value(value, ty.clone());
    }
    let (setup, ptr, len) = string_bytes(text, ctx);
    EmitResult::with_setup(
        setup,
        format!("{}.fromString({}, {})", prefix, ptr, len),
        ty.clone(),
    )
}
