//! `@Event` declarations and `Event.emit(...)`

use super::{build_args, check_value, types, IrBuilder};
use crate::compiler::abi::selector;
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{IrEvent, IrEventField, IrExpr, SemType};
use crate::error::{Error, Result};
use crate::parser::{ClassDecl, Expr};

/// At most this many fields may be `@Indexed`
pub const MAX_INDEXED: usize = 3;

/// Builds one `@Event` class
pub struct EventBuilder<'a> {
    class: &'a ClassDecl,
}

impl<'a> EventBuilder<'a> {
    /// Wraps an event class
    pub fn new(class: &'a ClassDecl) -> Self {
        EventBuilder { class }
    }
}

impl IrBuilder for EventBuilder<'_> {
    type Output = IrEvent;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        let name = self.class.display_name().to_string();
        if self.class.name.is_none() {
            ctx.syntax_error(SyntaxCode::MissingClassName, self.class.line, &["Event".into()]);
        }
        let mut fields = 0;
        let mut indexed = 0;
        for prop in self.class.properties() {
            fields += 1;
            if prop.decorators.iter().any(|d| d.name == "Indexed") {
                indexed += 1;
            }
            match &prop.ty {
                None => ctx.syntax_error(
                    SyntaxCode::MissingTypeAnnotation,
                    prop.line,
                    &[format!("{}.{}", name, prop.name)],
                ),
                Some(ty) => {
                    types::check_type(ty, ctx, prop.line);
                }
            }
        }
        if fields == 0 {
            ctx.semantic_error(
                SemanticCode::MissingFields,
                self.class.line,
                &["Event".into(), name.clone()],
            );
        }
        if indexed > MAX_INDEXED {
            ctx.semantic_error(
                SemanticCode::TooManyIndexedFields,
                self.class.line,
                &[name, indexed.to_string()],
            );
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrEvent> {
        let name = self.class.display_name().to_string();
        let mut fields = Vec::new();
        for prop in self.class.properties() {
            let Some(ty) = &prop.ty else { continue };
            fields.push(IrEventField {
                name: prop.name.clone(),
                ty: types::resolve_type(ty, ctx, prop.line)?,
                indexed: prop.decorators.iter().any(|d| d.name == "Indexed"),
            });
        }
        let field_types: Vec<SemType> = fields.iter().map(|f| f.ty.clone()).collect();
        let signature = selector::signature(&name, &field_types, &ctx.symbols);
        tracing::debug!(event = %name, %signature, "event declared");
        Ok(IrEvent {
            topic0: selector::topic(&signature),
            name,
            fields,
        })
    }
}

/// `Transfer.emit(from, to, value)`
pub fn emit_call(
    event: &str,
    method: &str,
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    if method != "emit" {
        return Err(Error::unsupported(
            format!("`{}.{}` (events only support `emit`)", event, method),
            line,
        ));
    }
    let decl = ctx
        .event(event)
        .cloned()
        .ok_or_else(|| Error::UndefinedSymbol {
            name: event.to_string(),
            line,
        })?;
    if args.len() != decl.fields.len() {
        return Err(Error::unsupported(
            format!(
                "`{}.emit` expects {} argument(s), got {}",
                event,
                decl.fields.len(),
                args.len()
            ),
            line,
        ));
    }
    let mut built = build_args(args, ctx)?;
    for (value, field) in built.iter_mut().zip(&decl.fields) {
        check_value(ctx, &field.name, &field.ty, value, line);
    }
    Ok(IrExpr::call(
        format!("{}.emit", event),
        None,
        built,
        SemType::Void,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::{Declaration, Parser};

    fn class(source: &str) -> ClassDecl {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let file = Parser::new(tokens).parse().unwrap();
        match file.declarations.into_iter().next().unwrap() {
            Declaration::Class(c) => c,
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_transfer_topic() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let decl = class(
            "@Event class Transfer { @Indexed from: Address; @Indexed to: Address; value: U256; }",
        );
        let event = EventBuilder::new(&decl).validate_and_build_ir(&mut ctx).unwrap();
        assert_eq!(
            selector::to_hex(&event.topic0),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert_eq!(event.fields.iter().filter(|f| f.indexed).count(), 2);
    }

    #[test]
    fn test_too_many_indexed() {
        let mut ctx = CompilationContext::new("t.ts", "t.ts");
        let decl = class(
            "@Event class Busy { @Indexed a: U256; @Indexed b: U256; @Indexed c: U256; @Indexed d: U256; }",
        );
        assert!(!EventBuilder::new(&decl).validate(&mut ctx));
        assert_eq!(ctx.diagnostics.semantic_errors()[0].code, "E017");
    }
}
