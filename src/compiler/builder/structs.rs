//! `@Struct` declarations, `StructFactory.create` and field access

use super::{build_expr, check_value, note_storage_read, types, IrBuilder};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{AssignTarget, IrExpr, IrExprKind, IrStruct, SemType, VarScope};
use crate::compiler::layout;
use crate::error::{Error, Result};
use crate::parser::{ClassDecl, Expr, ExprKind, TypeRef};

/// Builds the layout of one `@Struct` class
pub struct StructBuilder<'a> {
    class: &'a ClassDecl,
}

impl<'a> StructBuilder<'a> {
    /// Wraps a struct class
    pub fn new(class: &'a ClassDecl) -> Self {
        StructBuilder { class }
    }

    /// Resolved `(name, type)` pairs in declaration order; unannotated
    /// fields are skipped
    pub fn field_types(&self, ctx: &CompilationContext) -> Result<Vec<(String, SemType)>> {
        self.class
            .properties()
            .filter_map(|p| p.ty.as_ref().map(|ty| (p, ty)))
            .map(|(p, ty)| Ok((p.name.clone(), types::resolve_type(ty, ctx, p.line)?)))
            .collect()
    }
}

impl IrBuilder for StructBuilder<'_> {
    type Output = IrStruct;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        let name = self.class.display_name().to_string();
        if self.class.name.is_none() {
            ctx.syntax_error(SyntaxCode::MissingClassName, self.class.line, &["Struct".into()]);
        }
        let mut count = 0;
        for prop in self.class.properties() {
            count += 1;
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
        if count == 0 {
            ctx.semantic_error(
                SemanticCode::MissingFields,
                self.class.line,
                &["Struct".into(), name],
            );
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrStruct> {
        let name = self.class.display_name().to_string();
        let fields = self.field_types(ctx)?;
        if let Some(field) = layout::self_reference(&name, &fields) {
            let field = field.to_string();
            ctx.semantic_error(SemanticCode::SelfReferentialStruct, self.class.line, &[name.clone(), field]);
        }
        let def = layout::compute_layout(&name, &fields);
        ctx.symbols.declare_struct(def.clone());
        Ok(def)
    }
}

/// `StructFactory.create<T>([v1, v2, ...])`
pub fn factory_call(
    method: &str,
    type_args: &[TypeRef],
    args: &[Expr],
    ctx: &mut CompilationContext,
    line: usize,
) -> Result<IrExpr> {
    if method != "create" {
        return Err(Error::malformed_factory(
            "StructFactory",
            format!("unknown factory method `{}`", method),
            line,
        ));
    }
    let name = match type_args {
        [TypeRef::Named { name, args }] if args.is_empty() => name,
        _ => {
            return Err(Error::malformed_factory(
                "StructFactory",
                "expected exactly one struct type argument",
                line,
            ))
        }
    };
    let template = ctx
        .symbols
        .struct_template(name)
        .cloned()
        .ok_or_else(|| Error::UnknownType {
            name: name.clone(),
            line,
        })?;
    let items = match args {
        [Expr {
            kind: ExprKind::ArrayLiteral(items),
            ..
        }] => items,
        _ => {
            return Err(Error::malformed_factory(
                "StructFactory",
                "expected one array literal of field values",
                line,
            ))
        }
    };
    if items.len() != template.fields.len() {
        return Err(Error::malformed_factory(
            "StructFactory",
            format!(
                "`{}` has {} fields, got {} values",
                name,
                template.fields.len(),
                items.len()
            ),
            line,
        ));
    }

    let mut values = Vec::with_capacity(items.len());
    for (item, field) in items.iter().zip(&template.fields) {
        let mut value = build_expr(item, ctx)?;
        check_value(ctx, &format!("{}.{}", name, field.name), &field.ty, &mut value, line);
        values.push(value);
    }
    Ok(IrExpr::call(
        "StructFactory.create",
        None,
        values,
        SemType::Struct(name.clone()),
    ))
}

fn field_of(base: &IrExpr, field: &str, ctx: &CompilationContext, line: usize) -> Result<SemType> {
    let struct_name = match &base.ty {
        SemType::Struct(name) => name,
        other => {
            return Err(Error::unsupported(
                format!("field `{}` on {}", field, other),
                line,
            ))
        }
    };
    let template = ctx
        .symbols
        .struct_template(struct_name)
        .ok_or_else(|| Error::UnknownType {
            name: struct_name.clone(),
            line,
        })?;
    template
        .field(field)
        .map(|f| f.ty.clone())
        .ok_or_else(|| Error::UndefinedSymbol {
            name: format!("{}.{}", struct_name, field),
            line,
        })
}

/// `value.field`
pub fn field_read(base: IrExpr, field: &str, ctx: &mut CompilationContext, line: usize) -> Result<IrExpr> {
    let ty = field_of(&base, field, ctx, line)?;
    if base.scope() == VarScope::Storage {
        if let IrExprKind::Var { name, .. } = &base.kind {
            let label = format!("{}.{}", name, field);
            note_storage_read(ctx, &label, line);
        }
    }
    Ok(IrExpr::new(
        IrExprKind::Member {
            object: Box::new(base),
            field: field.to_string(),
        },
        ty,
    ))
}

/// Assignment target for `value.field = ...`
pub fn field_target(base: IrExpr, field: &str, ctx: &CompilationContext, line: usize) -> Result<AssignTarget> {
    let ty = field_of(&base, field, ctx, line)?;
    Ok(AssignTarget::Field {
        base,
        field: field.to_string(),
        ty,
    })
}
