//! Final assembly of the generated contract source
//!
//! Sections, in order: header and runtime import, storage slots and
//! accessors (inherited first), struct helpers, event/error/interface
//! helpers, `deploy`, method bodies with their exported entry wrappers and
//! the `user_entrypoint` dispatcher.

use crate::compiler::abi::struct_encoding::{emit_decoder, emit_encoder, TuplePlan};
use crate::compiler::abi::{self, selector_u32, to_hex, StructLookup};
use crate::compiler::ir::{
    IrConstructor, IrContract, IrInterface, IrMethod, IrParam, IrStruct, MethodRole, SemType,
    StateMutability, StorageVariable,
};
use crate::compiler::transform::{
    default_value, indent, names, storage_value, type_name, EmitContext, TransformerRegistry,
};

/// Default module the generated source imports its runtime from
pub const DEFAULT_RUNTIME_MODULE: &str = "@ascend/runtime";

const RUNTIME_NAMES: &[&str] = &[
    "Abi", "Address", "Block", "Boolean", "Calldata", "Host", "I256", "Log", "Memory", "Msg",
    "Storage", "Str", "U256",
];

/// Emitted source plus the warnings recorded while lowering
#[derive(Debug, Clone, PartialEq)]
pub struct EmitOutput {
    /// Generated source text
    pub source: String,
    /// Codegen warnings (unsupported expressions, skipped constructors)
    pub warnings: Vec<String>,
}

/// Turns an [`IrContract`] into target source
pub struct ContractEmitter<'a> {
    contract: &'a IrContract,
    registry: TransformerRegistry,
    runtime_module: String,
    entrypoint: bool,
}

impl<'a> ContractEmitter<'a> {
    /// Emitter with the default runtime module and dispatcher enabled
    pub fn new(contract: &'a IrContract) -> Self {
        ContractEmitter {
            contract,
            registry: TransformerRegistry::new(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            entrypoint: true,
        }
    }

    /// Module the runtime is imported from
    pub fn with_runtime_module(mut self, module: &str) -> Self {
        self.runtime_module = module.to_string();
        self
    }

    /// Whether to emit the `user_entrypoint` dispatcher
    pub fn with_entrypoint(mut self, enabled: bool) -> Self {
        self.entrypoint = enabled;
        self
    }

    /// Emits the whole contract
    pub fn emit(&self) -> EmitOutput {
        let mut ctx = EmitContext::new();
        let sections = vec![
            self.header(),
            self.storage_section(),
            self.struct_section(),
            self.declaration_section(),
            self.deploy(&mut ctx),
            self.method_section(&mut ctx),
            if self.entrypoint {
                self.dispatcher()
            } else {
                Vec::new()
            },
        ];

        let mut source = String::new();
        for section in sections.into_iter().filter(|s| !s.is_empty()) {
            if !source.is_empty() {
                source.push('\n');
            }
            for line in section {
                source.push_str(&line);
                source.push('\n');
            }
        }
        tracing::debug!(
            contract = %self.contract.name,
            bytes = source.len(),
            warnings = ctx.warnings().len(),
            "emitted contract"
        );
        EmitOutput {
            source,
            warnings: ctx.into_warnings(),
        }
    }

    fn header(&self) -> Vec<String> {
        vec![
            format!(
                "// Generated by ascend from {}. Do not edit.",
                self.contract.path
            ),
            format!(
                "import {{ {} }} from \"{}\";",
                RUNTIME_NAMES.join(", "),
                self.runtime_module
            ),
        ]
    }

    // Storage

    fn storage_section(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "const {}: u64 = u64.MAX_VALUE;",
            names::INITIALIZED_SLOT
        )];
        for var in self.contract.all_storage() {
            lines.push(format!(
                "const {}: u64 = {};",
                names::slot_const(&var.name),
                var.slot
            ));
        }
        for var in self.contract.all_storage() {
            lines.extend(self.accessors(var));
        }
        lines
    }

    fn accessors(&self, var: &StorageVariable) -> Vec<String> {
        let slot = names::slot_const(&var.name);
        match &var.ty {
            SemType::Mapping { key, value } => {
                let at = format!("Storage.mapSlot<{}>({}, key)", type_name(key), slot);
                vec![
                    load_fn(&names::load(&var.name), &format!("key: {}", type_name(key)), value, &at),
                    store_fn(&names::store(&var.name), &format!("key: {}, ", type_name(key)), value, &at),
                ]
            }
            SemType::MappingNested { key1, key2, value } => {
                let at = format!(
                    "Storage.mapSlot<{}>(Storage.mapSlot<{}>({}, key1), key2)",
                    type_name(key2),
                    type_name(key1),
                    slot
                );
                let keys = format!("key1: {}, key2: {}", type_name(key1), type_name(key2));
                vec![
                    load_fn(&names::load(&var.name), &keys, value, &at),
                    store_fn(&names::store(&var.name), &format!("{}, ", keys), value, &at),
                ]
            }
            SemType::StaticArray { element, length } => {
                let at = format!("Storage.offsetSlot({}, U256.toU64(index))", slot);
                vec![
                    format!(
                        "function {}(): U256 {{ return U256.fromU64({}); }}",
                        names::length(&var.name),
                        length
                    ),
                    load_fn(&names::load(&var.name), "index: U256", element, &at),
                    store_fn(&names::store(&var.name), "index: U256, ", element, &at),
                ]
            }
            SemType::DynamicArray(element) => {
                let at = format!("Storage.arraySlot({}, index)", slot);
                vec![
                    format!(
                        "function {}(): U256 {{ return Storage.loadU256({}); }}",
                        names::length(&var.name),
                        slot
                    ),
                    load_fn(&names::load(&var.name), "index: U256", element, &at),
                    store_fn(&names::store(&var.name), "index: U256, ", element, &at),
                    format!(
                        "function {}(value: {}): void {{",
                        names::push(&var.name),
                        storage_param_type(element)
                    ),
                    format!("  const n = {}();", names::length(&var.name)),
                    format!("  {}(n, value);", names::store(&var.name)),
                    format!("  Storage.storeU256({}, U256.add(n, U256.fromU64(1)));", slot),
                    "}".to_string(),
                ]
            }
            SemType::Struct(struct_name) => match self.contract.find_struct(struct_name) {
                Some(def) => storage_struct_accessors(&var.name, &slot, def),
                None => Vec::new(),
            },
            ty => vec![
                load_fn(&names::load(&var.name), "", ty, &slot),
                store_fn(&names::store(&var.name), "", ty, &slot),
            ],
        }
    }

    // Structs

    fn struct_section(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for def in self.contract.all_structs() {
            lines.extend(struct_helpers(def, self.contract));
        }
        lines
    }

    // Events, errors and interfaces

    fn declaration_section(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for event in self.contract.all_events() {
            lines.extend(abi::event::emit_helper(event, self.contract));
        }
        for error in self.contract.all_errors() {
            lines.extend(abi::error::emit_helper(error, self.contract));
        }
        for interface in self.contract.all_interfaces() {
            lines.extend(interface_stubs(interface, self.contract));
        }
        lines
    }

    // Deploy

    fn deploy(&self, ctx: &mut EmitContext) -> Vec<String> {
        let mut lines = vec![
            "export function deploy(input: usize, len: i32): i32 {".to_string(),
            format!(
                "  if (Storage.loadBoolean({}).value) return 1;",
                names::INITIALIZED_SLOT
            ),
        ];
        let effective = self.contract.effective_constructor();
        if !effective.is_some_and(|c| c.payable) {
            lines.push(indent(1, "if (!U256.isZero(Msg.value())) return 1;"));
        }
        lines.push(indent(
            1,
            &format!(
                "Storage.storeBoolean({}, Boolean.create(true));",
                names::INITIALIZED_SLOT
            ),
        ));

        let storage = self.contract.all_storage();
        for var in &storage {
            if !var.ty.is_scalar() && !matches!(var.ty, SemType::Interface(_)) {
                continue;
            }
            lines.push(indent(
                1,
                &format!(
                    "{}({});",
                    names::store(&var.name),
                    storage_value(&default_value(&var.ty), &var.ty)
                ),
            ));
        }
        for var in &storage {
            let Some(init) = &var.initializer else {
                continue;
            };
            let v = self.registry.expr(init, ctx);
            lines.extend(v.setup_lines.iter().map(|l| indent(1, l)));
            lines.push(indent(
                1,
                &format!(
                    "{}({});",
                    names::store(&var.name),
                    storage_value(&v.value_expr, &var.ty)
                ),
            ));
        }

        for ctor in self.contract.constructor_chain() {
            let is_effective = effective.is_some_and(|e| std::ptr::eq(e, ctor));
            if !is_effective && !ctor.inputs.is_empty() {
                ctx.warn(format!(
                    "inherited constructor with {} parameter(s) is not run by deploy",
                    ctor.inputs.len()
                ));
                continue;
            }
            lines.extend(self.constructor_block(ctor, is_effective, ctx));
        }
        lines.push(indent(1, "return 0;"));
        lines.push("}".to_string());
        lines
    }

    fn constructor_block(
        &self,
        ctor: &IrConstructor,
        decode_args: bool,
        ctx: &mut EmitContext,
    ) -> Vec<String> {
        let mut lines = vec![indent(1, "{")];
        if decode_args && !ctor.inputs.is_empty() {
            let plan = TuplePlan::new(&param_members(&ctor.inputs), self.contract);
            let (decode, _) = emit_decoder(&plan, "input", "0", "", self.contract);
            lines.extend(decode.iter().map(|l| indent(2, l)));
        }
        lines.extend(self.registry.block(&ctor.body, 2, ctx));
        lines.push(indent(1, "}"));
        lines
    }

    // Methods

    fn method_section(&self, ctx: &mut EmitContext) -> Vec<String> {
        let mut lines = Vec::new();
        let methods = self.contract.all_methods();
        for method in &methods {
            lines.extend(self.method_body(method, ctx));
        }
        for method in &methods {
            if method.visibility.is_exported() && method.role == MethodRole::Regular {
                lines.extend(entry_wrapper(method, self.contract));
            }
        }
        lines
    }

    fn method_body(&self, method: &IrMethod, ctx: &mut EmitContext) -> Vec<String> {
        let params: Vec<String> = method
            .inputs
            .iter()
            .map(|p| format!("{}: {}", p.name, type_name(&p.ty)))
            .collect();
        let output = method
            .output
            .as_ref()
            .map(type_name)
            .unwrap_or_else(|| "void".to_string());
        let mut lines = vec![format!(
            "function {}({}): {} {{",
            method.name,
            params.join(", "),
            output
        )];
        lines.extend(self.registry.block(&method.body, 1, ctx));
        lines.push("}".to_string());
        lines
    }

    // Dispatcher

    fn dispatcher(&self) -> Vec<String> {
        let methods = self.contract.exported_methods();
        let special = |role: MethodRole| methods.iter().find(|m| m.role == role);
        let mut lines = vec![
            "export function user_entrypoint(len: i32): i32 {".to_string(),
            indent(1, "const input = Calldata.read(len);"),
        ];

        if let Some(receive) = special(MethodRole::Receive) {
            lines.push(indent(1, "if (len == 0) {"));
            lines.push(indent(2, &format!("{}();", receive.name)));
            lines.push(indent(2, "return 0;"));
            lines.push(indent(1, "}"));
        }

        lines.push(indent(1, "if (len >= 4) {"));
        lines.push(indent(2, "const selector = Abi.selector(input);"));
        for method in methods.iter().filter(|m| m.role == MethodRole::Regular) {
            let sel = method_selector(self.contract, method);
            lines.push(indent(
                2,
                &format!(
                    "if (selector == {}) return {}(input, len);",
                    to_hex(&sel),
                    names::entry(&method.name)
                ),
            ));
        }
        lines.push(indent(1, "}"));

        match special(MethodRole::Fallback) {
            Some(fallback) => {
                if fallback.mutability != StateMutability::Payable {
                    lines.push(indent(1, "if (!U256.isZero(Msg.value())) return 1;"));
                }
                lines.push(indent(1, &format!("{}();", fallback.name)));
                lines.push(indent(1, "return 0;"));
            }
            None => lines.push(indent(1, "return 1;")),
        }
        lines.push("}".to_string());
        lines
    }
}

/// Selector of an exported method, from its canonical signature
pub fn method_selector(contract: &IrContract, method: &IrMethod) -> [u8; 4] {
    let types: Vec<SemType> = method.inputs.iter().map(|p| p.ty.clone()).collect();
    abi::selector(&abi::signature(&method.name, &types, contract))
}

fn param_members(params: &[IrParam]) -> Vec<(String, SemType)> {
    params
        .iter()
        .map(|p| (p.name.clone(), p.ty.clone()))
        .collect()
}

/// Exported ABI wrapper: value check, argument decoding, call and return
/// encoding
fn entry_wrapper(method: &IrMethod, structs: &dyn StructLookup) -> Vec<String> {
    let mut lines = vec![format!(
        "export function {}(input: usize, len: i32): i32 {{",
        names::entry(&method.name)
    )];
    if method.mutability != StateMutability::Payable {
        lines.push(indent(1, "if (!U256.isZero(Msg.value())) return 1;"));
    }
    let plan = TuplePlan::new(&param_members(&method.inputs), structs);
    let (decode, vars) = emit_decoder(&plan, "input", "4", "__a_", structs);
    lines.extend(decode.iter().map(|l| indent(1, l)));

    let call = format!("{}({})", method.name, vars.join(", "));
    match &method.output {
        Some(ty) => {
            lines.push(indent(1, &format!("const __ret = {};", call)));
            let out = TuplePlan::new(&[("ret".to_string(), ty.clone())], structs);
            let encode = emit_encoder(&out, &["__ret".to_string()], "__out", 0, structs);
            lines.extend(encode.iter().map(|l| indent(1, l)));
            lines.push(indent(1, "Host.output(__out, __out_size);"));
        }
        None => lines.push(indent(1, &format!("{};", call))),
    }
    lines.push(indent(1, "return 0;"));
    lines.push("}".to_string());
    lines
}

/// Boolean storage values are boxed
fn storage_param_type(ty: &SemType) -> String {
    match ty {
        SemType::Bool => "Boolean".to_string(),
        other => type_name(other),
    }
}

fn load_fn(name: &str, params: &str, ty: &SemType, at: &str) -> String {
    let read = format!("Storage.load{}({})", ty.storage_suffix(), at);
    let read = match ty {
        SemType::Bool => format!("{}.value", read),
        _ => read,
    };
    format!(
        "function {}({}): {} {{ return {}; }}",
        name,
        params,
        type_name(ty),
        read
    )
}

/// `params` is either empty or ends with `", "`
fn store_fn(name: &str, params: &str, ty: &SemType, at: &str) -> String {
    format!(
        "function {}({}value: {}): void {{ Storage.store{}({}, value); }}",
        name,
        params,
        storage_param_type(ty),
        ty.storage_suffix(),
        at
    )
}

/// Per-field accessors of a storage struct plus whole-value load/store
///
/// Field `i` lives at `base + i`.
fn storage_struct_accessors(var: &str, slot: &str, def: &IrStruct) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, field) in def.fields.iter().enumerate() {
        let at = format!("Storage.offsetSlot({}, {})", slot, i);
        lines.push(load_fn(&names::load_field(var, &field.name), "", &field.ty, &at));
        lines.push(store_fn(&names::store_field(var, &field.name), "", &field.ty, &at));
    }
    let loads: Vec<String> = def
        .fields
        .iter()
        .map(|f| format!("{}()", names::load_field(var, &f.name)))
        .collect();
    lines.push(format!(
        "function {}(): usize {{ return {}({}); }}",
        names::load(var),
        names::struct_create(&def.name),
        loads.join(", ")
    ));
    lines.push(format!("function {}(value: usize): void {{", names::store(var)));
    for field in &def.fields {
        let get = format!("{}(value)", names::struct_get(&def.name, &field.name));
        lines.push(indent(
            1,
            &format!(
                "{}({});",
                names::store_field(var, &field.name),
                storage_value(&get, &field.ty)
            ),
        ));
    }
    lines.push("}".to_string());
    lines
}

/// Memory accessor suffix; pointers for nested aggregates
fn memory_access(ty: &SemType) -> (String, String) {
    match ty {
        SemType::U256 | SemType::I256 | SemType::Address | SemType::Interface(_) | SemType::Str => (
            format!("Memory.load{}", ty.storage_suffix()),
            format!("Memory.store{}", ty.storage_suffix()),
        ),
        SemType::Bool => ("Memory.loadBool".to_string(), "Memory.storeBool".to_string()),
        _ => ("load<usize>".to_string(), "store<usize>".to_string()),
    }
}

/// `_alloc`, `_create`, field getters/setters and the ABI codec of a struct
pub fn struct_helpers(def: &IrStruct, structs: &dyn StructLookup) -> Vec<String> {
    let name = &def.name;
    let mut lines = vec![format!(
        "function {}(): usize {{ return Memory.alloc({}); }}",
        names::struct_alloc(name),
        def.total_size
    )];
    for field in &def.fields {
        let (load, store) = memory_access(&field.ty);
        let ty = type_name(&field.ty);
        lines.push(format!(
            "function {}(ptr: usize): {} {{ return {}(ptr + {}); }}",
            names::struct_get(name, &field.name),
            ty,
            load,
            field.offset
        ));
        lines.push(format!(
            "function {}(ptr: usize, value: {}): void {{ {}(ptr + {}, value); }}",
            names::struct_set(name, &field.name),
            ty,
            store,
            field.offset
        ));
    }

    let params: Vec<String> = def
        .fields
        .iter()
        .map(|f| format!("{}: {}", f.name, type_name(&f.ty)))
        .collect();
    lines.push(format!(
        "function {}({}): usize {{",
        names::struct_create(name),
        params.join(", ")
    ));
    lines.push(indent(1, &format!("const ptr = {}();", names::struct_alloc(name))));
    for field in &def.fields {
        lines.push(indent(
            1,
            &format!("{}(ptr, {});", names::struct_set(name, &field.name), field.name),
        ));
    }
    lines.push(indent(1, "return ptr;"));
    lines.push("}".to_string());

    let plan = TuplePlan::for_struct(def, structs);
    let values: Vec<String> = def
        .fields
        .iter()
        .map(|f| format!("{}(ptr)", names::struct_get(name, &f.name)))
        .collect();
    lines.push(format!("function {}(ptr: usize): usize {{", names::struct_encode(name)));
    lines.extend(
        emit_encoder(&plan, &values, "__enc", 0, structs)
            .iter()
            .map(|l| indent(1, l)),
    );
    lines.push(indent(1, "return __enc;"));
    lines.push("}".to_string());

    lines.push(format!(
        "function {}(input: usize, base: u32, at: u32): usize {{",
        names::struct_decode(name)
    ));
    // Static structs sit in place; dynamic ones behind an offset word
    let start = if plan.dynamic {
        "base + Abi.decodeOffset(input, at)"
    } else {
        "at"
    };
    lines.push(indent(1, &format!("const start: u32 = {};", start)));
    let (decode, vars) = emit_decoder(&plan, "input", "start", "__f_", structs);
    lines.extend(decode.iter().map(|l| indent(1, l)));
    lines.push(indent(
        1,
        &format!("return {}({});", names::struct_create(name), vars.join(", ")),
    ));
    lines.push("}".to_string());
    lines
}

/// Cross-contract call stubs of one interface
///
/// Arguments follow the 4-byte selector; view and pure methods use a static
/// call.
pub fn interface_stubs(interface: &IrInterface, structs: &dyn StructLookup) -> Vec<String> {
    let mut lines = Vec::new();
    for method in &interface.methods {
        let mut params = vec!["target: Address".to_string()];
        params.extend(
            method
                .inputs
                .iter()
                .map(|p| format!("{}: {}", p.name, type_name(&p.ty))),
        );
        let output = method
            .output
            .as_ref()
            .map(type_name)
            .unwrap_or_else(|| "void".to_string());
        lines.push(format!(
            "function {}({}): {} {{",
            names::interface_call(&interface.name, &method.name),
            params.join(", "),
            output
        ));

        let plan = TuplePlan::new(&param_members(&method.inputs), structs);
        let values: Vec<String> = method.inputs.iter().map(|p| p.name.clone()).collect();
        lines.extend(
            emit_encoder(&plan, &values, "__cd", 4, structs)
                .iter()
                .map(|l| indent(1, l)),
        );
        lines.push(indent(
            1,
            &format!(
                "Abi.writeSelector(__cd, {});",
                to_hex(&method.selector)
            ),
        ));
        let host_call = if method.mutability.is_read_only() {
            "Host.staticCall"
        } else {
            "Host.call"
        };
        lines.push(indent(
            1,
            &format!("const __res = {}(target, __cd, __cd_size);", host_call),
        ));
        if let Some(ty) = &method.output {
            let out = TuplePlan::new(&[("ret".to_string(), ty.clone())], structs);
            let (decode, vars) = emit_decoder(&out, "__res", "0", "__r_", structs);
            lines.extend(decode.iter().map(|l| indent(1, l)));
            lines.push(indent(1, &format!("return {};", vars[0])));
        }
        lines.push("}".to_string());
        tracing::debug!(
            interface = %interface.name,
            method = %method.name,
            selector = selector_u32(method.selector),
            "interface stub"
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::{
        AssignTarget, IrExpr, IrInterfaceMethod, IrStmt, VarScope, Visibility,
    };
    use crate::compiler::layout::compute_layout;

    fn storage(name: &str, ty: SemType, slot: usize) -> StorageVariable {
        StorageVariable {
            name: name.into(),
            ty,
            slot,
            field_count: 1,
            initializer: None,
        }
    }

    fn counter() -> IrContract {
        let increment = IrMethod {
            name: "increment".into(),
            visibility: Visibility::Public,
            mutability: StateMutability::Nonpayable,
            role: MethodRole::Regular,
            inputs: vec![],
            output: None,
            body: vec![IrStmt::Assign {
                target: AssignTarget::Var {
                    name: "count".into(),
                    scope: VarScope::Storage,
                    ty: SemType::U256,
                },
                value: IrExpr::call(
                    "U256.add",
                    Some(IrExpr::var("count", VarScope::Storage, SemType::U256)),
                    vec![IrExpr::int("1", SemType::U256)],
                    SemType::U256,
                ),
            }],
        };
        let get = IrMethod {
            name: "get".into(),
            visibility: Visibility::Public,
            mutability: StateMutability::View,
            role: MethodRole::Regular,
            inputs: vec![],
            output: Some(SemType::U256),
            body: vec![IrStmt::Return(Some(IrExpr::var(
                "count",
                VarScope::Storage,
                SemType::U256,
            )))],
        };
        IrContract {
            name: "Counter".into(),
            path: "counter.ts".into(),
            parent: None,
            storage: vec![storage("count", SemType::U256, 0)],
            methods: vec![increment, get],
            constructor: None,
            structs: vec![],
            events: vec![],
            errors: vec![],
            interfaces: vec![],
        }
    }

    #[test]
    fn test_counter_sections_in_order() {
        let out = ContractEmitter::new(&counter()).emit();
        let src = &out.source;
        assert!(out.warnings.is_empty());
        let pos = |needle: &str| src.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
        assert!(pos("import {") < pos("const SLOT_count: u64 = 0;"));
        assert!(pos("const SLOT_count") < pos("export function deploy"));
        assert!(pos("export function deploy") < pos("function increment(): void {"));
        assert!(pos("function increment") < pos("export function user_entrypoint"));
        assert_eq!(src.matches("function load_count()").count(), 1);
        assert_eq!(src.matches("function store_count(").count(), 1);
        assert!(src.contains("  store_count(U256.add(load_count(), U256.fromU64(1)));"));
        assert!(src.contains("  store_count(U256.create());"));
    }

    #[test]
    fn test_dispatcher_routes_selectors() {
        let contract = counter();
        let src = ContractEmitter::new(&contract).emit().source;
        let sel = to_hex(&method_selector(&contract, &contract.methods[0]));
        assert!(src.contains(&format!("if (selector == {}) return __entry_increment(input, len);", sel)));
        assert!(src.contains("  const __ret = get();"));
        assert!(src.contains("  Host.output(__out, __out_size);"));
        assert!(src.contains("  return 1;\n}"));
    }

    #[test]
    fn test_entrypoint_can_be_disabled() {
        let contract = counter();
        let src = ContractEmitter::new(&contract)
            .with_entrypoint(false)
            .with_runtime_module("./runtime")
            .emit()
            .source;
        assert!(!src.contains("user_entrypoint"));
        assert!(src.contains("from \"./runtime\";"));
    }

    #[test]
    fn test_mapping_accessors_take_keys() {
        let mut contract = counter();
        contract.storage = vec![storage(
            "balances",
            SemType::Mapping {
                key: Box::new(SemType::Address),
                value: Box::new(SemType::U256),
            },
            0,
        )];
        contract.methods.clear();
        let src = ContractEmitter::new(&contract).emit().source;
        assert!(src.contains(
            "function load_balances(key: Address): U256 { return Storage.loadU256(Storage.mapSlot<Address>(SLOT_balances, key)); }"
        ));
        // Mappings start empty
        assert!(!src.contains("store_balances(U256.create())"));
    }

    #[test]
    fn test_struct_helpers() {
        let def = compute_layout(
            "Position",
            &[
                ("owner".to_string(), SemType::Address),
                ("label".to_string(), SemType::Str),
            ],
        );
        let lines = struct_helpers(&def, &vec![def.clone()]);
        assert_eq!(lines[0], "function Position_alloc(): usize { return Memory.alloc(64); }");
        assert!(lines.contains(
            &"function Position_get_label(ptr: usize): Str { return Memory.loadStr(ptr + 32); }"
                .to_string()
        ));
        assert!(lines.contains(&"function Position_create(owner: Address, label: Str): usize {".to_string()));
        assert!(lines.contains(&"  return Position_create(__f_owner, __f_label);".to_string()));
    }

    #[test]
    fn test_interface_stub_uses_static_call_for_views() {
        let interface = IrInterface {
            name: "IToken".into(),
            methods: vec![IrInterfaceMethod {
                name: "balanceOf".into(),
                inputs: vec![IrParam {
                    name: "owner".into(),
                    ty: SemType::Address,
                }],
                output: Some(SemType::U256),
                mutability: StateMutability::View,
                selector: abi::selector("balanceOf(address)"),
            }],
        };
        let lines = interface_stubs(&interface, &Vec::<IrStruct>::new());
        assert_eq!(
            lines[0],
            "function __call_IToken_balanceOf(target: Address, owner: Address): U256 {"
        );
        assert!(lines.contains(&"  Abi.writeSelector(__cd, 0x70a08231);".to_string()));
        assert!(lines.contains(&"  const __res = Host.staticCall(target, __cd, __cd_size);".to_string()));
        assert!(lines.contains(&"  return __r_ret;".to_string()));
    }

    #[test]
    fn test_parameterized_parent_constructor_is_skipped() {
        let mut parent = counter();
        parent.name = "Base".into();
        parent.methods.clear();
        parent.constructor = Some(IrConstructor {
            inputs: vec![IrParam {
                name: "start".into(),
                ty: SemType::U256,
            }],
            body: vec![],
            payable: false,
        });
        let mut child = counter();
        child.storage = vec![storage("extra", SemType::Bool, 1)];
        child.parent = Some(Box::new(parent));
        child.constructor = Some(IrConstructor {
            inputs: vec![],
            body: vec![],
            payable: true,
        });
        let out = ContractEmitter::new(&child).emit();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.source.contains("  store_extra(Boolean.create(false));"));
        // Payable constructor skips the value check in deploy
        let deploy = &out.source[out.source.find("export function deploy").unwrap()..];
        let deploy = &deploy[..deploy.find("\n}\n").unwrap()];
        assert!(!deploy.contains("Msg.value()"));
    }
}
