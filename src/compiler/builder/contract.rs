//! Contract builder
//!
//! Drives analysis of one compilation unit: declarations first (structs,
//! interfaces, events, errors), then storage, method signatures, the
//! inherited scope, and finally initializers and bodies.

use std::collections::HashMap;

use super::errors::{is_error_decl, ErrorBuilder};
use super::events::EventBuilder;
use super::inheritance::ResolvedParent;
use super::interfaces::InterfaceBuilder;
use super::structs::StructBuilder;
use super::{build_expr, check_value, types, ConstructorBuilder, IrBuilder, MethodBuilder};
use crate::compiler::context::{CompilationContext, MethodFrame};
use crate::compiler::diagnostics::{SemanticCode, SyntaxCode};
use crate::compiler::ir::{
    IrContract, IrStruct, SemType, StateMutability, StorageVariable, Visibility,
};
use crate::compiler::layout;
use crate::compiler::symbols::VariableInfo;
use crate::error::{Error, Result};
use crate::parser::{ClassDecl, ConstDecl, Declaration, PropertyDecl, SourceFile};

/// Role of a top-level class, from its decorator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRole {
    /// `@Contract`
    Contract,
    /// `@Struct`
    Struct,
    /// `@Event`
    Event,
    /// `@Interface`
    Interface,
}

impl ClassRole {
    /// Role of `class`, if it carries one of the known decorators
    pub fn of(class: &ClassDecl) -> Option<ClassRole> {
        class.decorators.iter().find_map(|d| match d.name.as_str() {
            "Contract" => Some(ClassRole::Contract),
            "Struct" => Some(ClassRole::Struct),
            "Event" => Some(ClassRole::Event),
            "Interface" => Some(ClassRole::Interface),
            _ => None,
        })
    }
}

/// Contract classes of a file, in source order
pub fn contract_classes(file: &SourceFile) -> Vec<&ClassDecl> {
    file.classes()
        .filter(|c| ClassRole::of(c) == Some(ClassRole::Contract))
        .collect()
}

/// Builds the [`IrContract`] of one source file
pub struct ContractBuilder<'a> {
    file: &'a SourceFile,
    parent: Option<ResolvedParent>,
    imported: Vec<Declaration>,
}

impl<'a> ContractBuilder<'a> {
    /// Wraps a parsed file
    pub fn new(file: &'a SourceFile) -> Self {
        ContractBuilder {
            file,
            parent: None,
            imported: Vec::new(),
        }
    }

    /// Sets the analyzed parent contract
    pub fn with_parent(mut self, parent: Option<ResolvedParent>) -> Self {
        self.parent = parent;
        self
    }

    /// Adds declarations brought in by imports
    pub fn with_imports(mut self, imported: Vec<Declaration>) -> Self {
        self.imported = imported;
        self
    }

    /// Local declarations followed by imported ones
    fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.file.declarations.iter().chain(self.imported.iter())
    }

    fn classes_with(&self, role: ClassRole) -> Vec<&ClassDecl> {
        self.declarations()
            .filter_map(|d| match d {
                Declaration::Class(c) if ClassRole::of(c) == Some(role) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn consts(&self) -> Vec<&ConstDecl> {
        self.declarations()
            .filter_map(|d| match d {
                Declaration::Const(c) => Some(c),
                Declaration::Class(_) => None,
            })
            .collect()
    }

    fn build_structs(&self, ctx: &mut CompilationContext) -> Result<Vec<IrStruct>> {
        let classes = self.classes_with(ClassRole::Struct);
        for class in &classes {
            if let Some(name) = &class.name {
                ctx.pending_structs.insert(name.clone());
            }
        }

        let mut defs = HashMap::new();
        for class in &classes {
            let builder = StructBuilder::new(class);
            defs.insert(class.display_name().to_string(), builder.field_types(ctx)?);
        }
        for cycle in layout::find_cycles(&defs) {
            ctx.semantic_error(SemanticCode::CyclicStruct, 0, &[cycle.join(" -> ")]);
        }

        let mut built = Vec::with_capacity(classes.len());
        for class in classes {
            built.push(StructBuilder::new(class).validate_and_build_ir(ctx)?);
        }
        Ok(built)
    }

    fn build_declarations(&self, ctx: &mut CompilationContext) -> Result<()> {
        for class in self.classes_with(ClassRole::Interface) {
            let iface = InterfaceBuilder::new(class).validate_and_build_ir(ctx)?;
            ctx.register_interface(iface);
        }
        for class in self.classes_with(ClassRole::Event) {
            let event = EventBuilder::new(class).validate_and_build_ir(ctx)?;
            ctx.register_event(event);
        }
        for decl in self.consts() {
            if !is_error_decl(decl) {
                return Err(Error::unsupported(
                    format!("top-level const `{}`", decl.name),
                    decl.line,
                ));
            }
            let error = ErrorBuilder::new(decl).validate_and_build_ir(ctx)?;
            ctx.register_error(error);
        }
        Ok(())
    }

    fn declare_storage(
        &self,
        contract: &'a ClassDecl,
        ctx: &mut CompilationContext,
    ) -> Result<Vec<(StorageVariable, &'a PropertyDecl)>> {
        let mut storage = Vec::new();
        for prop in contract.properties() {
            if prop.is_static {
                return Err(Error::unsupported(
                    format!("static field `{}`", prop.name),
                    prop.line,
                ));
            }
            let ty = match &prop.ty {
                None => {
                    ctx.syntax_error(
                        SyntaxCode::MissingTypeAnnotation,
                        prop.line,
                        &[prop.name.clone()],
                    );
                    SemType::U256
                }
                Some(ty) => {
                    types::check_type(ty, ctx, prop.line);
                    types::resolve_type(ty, ctx, prop.line)?
                }
            };
            let inherited = self
                .parent
                .as_ref()
                .map(|p| p.context.symbols.lookup_storage(&prop.name).is_some())
                .unwrap_or(false);
            if inherited {
                ctx.semantic_error(SemanticCode::ShadowedStorage, prop.line, &[prop.name.clone()]);
                continue;
            }
            if !ctx
                .symbols
                .declare_variable(&prop.name, VariableInfo::storage(&prop.name, ty.clone()))
            {
                ctx.semantic_error(
                    SemanticCode::DuplicateVariable,
                    prop.line,
                    &[prop.name.clone()],
                );
                continue;
            }
            let range = ctx.symbols.slots().get(&prop.name).ok_or_else(|| {
                Error::compiler(format!("no slot allocated for `{}`", prop.name))
            })?;
            storage.push((
                StorageVariable {
                    name: prop.name.clone(),
                    ty,
                    slot: range.base,
                    field_count: range.field_count,
                    initializer: None,
                },
                prop,
            ));
        }
        Ok(storage)
    }
}

impl IrBuilder for ContractBuilder<'_> {
    type Output = IrContract;

    fn validate(&mut self, ctx: &mut CompilationContext) -> bool {
        let before = ctx.diagnostics.len();
        if self.file.declarations.is_empty() {
            ctx.syntax_error(SyntaxCode::EmptySource, 1, &[]);
            return false;
        }

        let contracts = contract_classes(self.file);
        match contracts.len() {
            0 => ctx.syntax_error(SyntaxCode::NoContract, 1, &[]),
            1 => {}
            n => {
                let names: Vec<&str> = contracts.iter().map(|c| c.display_name()).collect();
                ctx.syntax_error(
                    SyntaxCode::MultipleContracts,
                    contracts[1].line,
                    &[n.to_string(), names.join(", ")],
                );
            }
        }

        for contract in &contracts {
            let name = contract.display_name().to_string();
            if contract.name.is_none() {
                ctx.syntax_error(SyntaxCode::MissingClassName, contract.line, &["Contract".into()]);
            }
            let ctors = contract.constructors().count();
            if ctors > 1 {
                ctx.syntax_error(
                    SyntaxCode::MultipleConstructors,
                    contract.line,
                    &[name.clone(), ctors.to_string()],
                );
            }
            if contract.heritage.len() > 1 {
                ctx.semantic_error(
                    SemanticCode::MultipleInheritance,
                    contract.line,
                    &[name.clone(), contract.heritage.len().to_string()],
                );
            }
            let mut seen: Vec<&str> = Vec::new();
            for method in contract.methods() {
                if seen.contains(&method.name.as_str()) {
                    ctx.semantic_error(
                        SemanticCode::DuplicateMethod,
                        method.line,
                        &[method.name.clone()],
                    );
                } else {
                    seen.push(&method.name);
                }
            }
        }
        ctx.diagnostics.len() == before
    }

    fn build_ir(&mut self, ctx: &mut CompilationContext) -> Result<IrContract> {
        let contracts = contract_classes(self.file);
        let contract = match contracts.as_slice() {
            [only] => *only,
            _ => {
                return Err(Error::ValidationFailed {
                    count: ctx.diagnostics.len(),
                    report: ctx.diagnostics.render_report(),
                })
            }
        };
        let name = contract.display_name().to_string();
        tracing::debug!(contract = %name, file = %self.file.path, "building contract");

        if let Some(parent) = &self.parent {
            ctx.symbols.slots_mut().absorb(parent.context.symbols.slots());
            ctx.inherit_declarations(&parent.context);
            for def in parent.contract.all_structs() {
                ctx.symbols.declare_struct(def.clone());
            }
            ctx.diagnostics.extend(&parent.context.diagnostics);
        }

        let structs = self.build_structs(ctx)?;
        self.build_declarations(ctx)?;

        let declared = self.declare_storage(contract, ctx)?;

        for method in contract.methods() {
            let info = MethodBuilder::new(method).signature(ctx)?;
            if ctx.symbols.lookup_storage(&method.name).is_some() {
                ctx.semantic_error(
                    SemanticCode::DuplicateVariable,
                    method.line,
                    &[method.name.clone()],
                );
            }
            // Duplicates were reported by validate
            ctx.symbols.declare_function(info);
        }

        if let Some(parent) = &self.parent {
            ctx.symbols.merge(&parent.context.symbols);
        }

        let mut storage = Vec::with_capacity(declared.len());
        for (mut var, prop) in declared {
            if let Some(init) = &prop.initializer {
                ctx.method = Some(MethodFrame {
                    name: "constructor".into(),
                    mutability: StateMutability::Nonpayable,
                    visibility: Visibility::Public,
                    return_type: None,
                });
                let value = build_expr(init, ctx);
                ctx.method = None;
                let mut value = value?;
                check_value(ctx, &var.name, &var.ty, &mut value, init.line);
                var.initializer = Some(value);
            }
            storage.push(var);
        }

        let constructor = match contract.constructors().next() {
            Some(ctor) => Some(ConstructorBuilder::new(ctor).validate_and_build_ir(ctx)?),
            None => None,
        };

        let mut methods = Vec::new();
        for method in contract.methods() {
            methods.push(MethodBuilder::new(method).validate_and_build_ir(ctx)?);
        }

        let parent = self.parent.take();
        let inherited = |kind: &str, n: &str| {
            parent.as_ref().is_some_and(|p| match kind {
                "event" => p.context.event(n).is_some(),
                "error" => p.context.error_decl(n).is_some(),
                _ => p.context.interface(n).is_some(),
            })
        };
        let events = ctx
            .events
            .iter()
            .filter(|e| !inherited("event", &e.name))
            .cloned()
            .collect();
        let errors = ctx
            .errors
            .iter()
            .filter(|e| !inherited("error", &e.name))
            .cloned()
            .collect();
        let interfaces = ctx
            .interfaces
            .iter()
            .filter(|i| !inherited("interface", &i.name))
            .cloned()
            .collect();

        Ok(IrContract {
            name,
            path: self.file.path.clone(),
            parent: parent.map(|p| Box::new(p.contract)),
            storage,
            methods,
            constructor,
            structs,
            events,
            errors,
            interfaces,
        })
    }
}
