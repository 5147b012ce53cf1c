//! End-to-end compilation of single-file contracts
//! Demonstrates: Scanner → Parser → IR builders → Emitter → ABI working together

use ascend::compiler::abi::{selector, to_hex};
use ascend::compiler::{CompileOptions, Compiler, MemorySourceProvider, ValidationMode};
use ascend::Error;

const COUNTER: &str = r#"
    @Contract
    export class Counter {
      count: U256;

      @External
      increment(): void {
        this.count = this.count.add(U256Factory.fromString("1"));
      }

      @View
      get(): U256 {
        return this.count;
      }
    }
"#;

const TOKEN: &str = r#"
    @Event
    export class Transfer {
      @Indexed from: Address;
      @Indexed to: Address;
      value: U256;
    }

    const InsufficientBalance = ErrorFactory.create<[Address, U256, Address]>();

    @Contract
    export class Token {
      balances: Mapping<Address, U256>;
      totalSupply: U256;

      constructor(supply: U256) {
        this.totalSupply = supply;
        this.balances[msg.sender] = supply;
      }

      @External
      transfer(to: Address, amount: U256): boolean {
        const sender = msg.sender;
        const balance = this.balances[sender];
        if (balance < amount) {
          InsufficientBalance.revert(sender, balance, to);
        }
        this.balances[sender] = balance.sub(amount);
        this.balances[to] += amount;
        Transfer.emit(sender, to, amount);
        return true;
      }

      @View
      balanceOf(owner: Address): U256 {
        return this.balances[owner];
      }
    }
"#;

fn compiler(options: CompileOptions) -> Compiler {
    Compiler::with_provider(options, Box::new(MemorySourceProvider::new()))
}

/// Body of the generated function `name`, up to its closing brace
fn function_body<'a>(source: &'a str, header: &str) -> &'a str {
    let start = source
        .find(header)
        .unwrap_or_else(|| panic!("missing `{}`", header));
    let rest = &source[start..];
    let end = rest.find("\n}\n").expect("unterminated function");
    &rest[..end]
}

#[test]
fn test_counter_load_add_store() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("counter.ts", COUNTER).unwrap();

    assert_eq!(result.ir.storage.len(), 1);
    assert_eq!(result.ir.storage[0].slot, 0);
    assert!(result.source.contains("const SLOT_count: u64 = 0;"));
    assert_eq!(result.source.matches("function load_count()").count(), 1);
    assert_eq!(result.source.matches("function store_count(").count(), 1);

    let body = function_body(&result.source, "function increment(): void {");
    let load = body.find("load_count()").unwrap();
    let add = body.find("U256.add(").unwrap();
    let store = body.find("store_count(").unwrap();
    assert!(load < store);
    assert!(add < store);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn test_mapping_declaration_order() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();

    let slots: Vec<(&str, usize)> = result
        .ir
        .storage
        .iter()
        .map(|s| (s.name.as_str(), s.slot))
        .collect();
    assert_eq!(slots, vec![("balances", 0), ("totalSupply", 1)]);
    assert!(result.source.contains("const SLOT_balances: u64 = 0;"));
    assert!(result.source.contains("const SLOT_totalSupply: u64 = 1;"));
}

#[test]
fn test_transfer_selector_dispatch() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();
    assert!(result
        .source
        .contains("if (selector == 0xa9059cbb) return __entry_transfer(input, len);"));
    assert!(result.source.contains("export function __entry_balanceOf(input: usize, len: i32): i32 {"));
}

#[test]
fn test_custom_error_encoder() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();

    let error = &result.ir.errors[0];
    assert_eq!(error.fields.len(), 3);
    assert_eq!(
        error.selector,
        selector("InsufficientBalance(address,uint256,address)")
    );

    let helper = function_body(&result.source, "function __revert_InsufficientBalance(");
    assert!(helper.contains("arg0: Address, arg1: U256, arg2: Address"));
    assert!(helper.contains("Abi.writeAddress(__err, 4, arg0);"));
    assert!(helper.contains("Abi.writeU256(__err, 36, arg1);"));
    assert!(helper.contains("Abi.writeAddress(__err, 68, arg2);"));
    assert!(helper.contains(&format!(
        "store<u8>(__err + 0, 0x{:02x});",
        error.selector[0]
    )));

    let transfer = function_body(&result.source, "function transfer(");
    assert!(transfer.contains("__revert_InsufficientBalance("));
    assert!(transfer.contains("__emit_Transfer("));
}

#[test]
fn test_abi_document() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();

    let json: serde_json::Value = serde_json::from_str(&result.abi_json).unwrap();
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["constructor", "function", "function", "event", "error"]);
    assert_eq!(json[0]["inputs"][0]["name"], "supply");
    assert_eq!(json[1]["name"], "transfer");
    assert_eq!(json[1]["stateMutability"], "nonpayable");
    assert_eq!(json[1]["outputs"][0]["type"], "bool");
    assert_eq!(json[2]["stateMutability"], "view");
    assert_eq!(json[3]["inputs"][0]["indexed"], true);
    assert_eq!(json[4]["inputs"][2]["type"], "address");

    let topic = to_hex(&result.ir.events[0].topic0);
    assert_eq!(
        topic,
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
}

#[test]
fn test_abi_without_events_and_errors() {
    let mut compiler = compiler(CompileOptions::default().abi_events_and_errors(false));
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();
    assert_eq!(result.abi.len(), 3);
}

#[test]
fn test_deploy_runs_constructor_once() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("token.ts", TOKEN).unwrap();
    let deploy = function_body(&result.source, "export function deploy(");
    assert!(deploy.contains("if (Storage.loadBoolean(__INITIALIZED_SLOT).value) return 1;"));
    assert!(deploy.contains("const supply = Abi.decodeU256(input, 0 + 0);"));
    assert!(deploy.contains("store_totalSupply(supply);"));
}

#[test]
fn test_payable_constructor_accepts_value() {
    let source = r#"
        @Contract
        export class Vault {
          total: U256;

          @Payable
          constructor() {
            this.total = msg.value;
          }
        }
    "#;
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("vault.ts", source).unwrap();
    let deploy = function_body(&result.source, "export function deploy(");
    assert!(!deploy.contains("if (!U256.isZero(Msg.value())) return 1;"));
    assert!(deploy.contains("store_total(Msg.value());"));

    let json: serde_json::Value = serde_json::from_str(&result.abi_json).unwrap();
    assert_eq!(json[0]["type"], "constructor");
    assert_eq!(json[0]["stateMutability"], "payable");
}

#[test]
fn test_constructor_entry_without_declaration() {
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("counter.ts", COUNTER).unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.abi_json).unwrap();
    assert_eq!(json[0]["type"], "constructor");
    assert_eq!(json[0]["stateMutability"], "nonpayable");
    assert_eq!(json[0]["inputs"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_static_struct_param_is_inline() {
    let source = r#"
        @Struct
        class Point {
          x: U256;
          y: U256;
        }

        @Contract
        export class Board {
          owner: Address;

          @External
          setOrigin(p: Point, to: Address): void {
            this.owner = to;
          }
        }
    "#;
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("board.ts", source).unwrap();

    let entry = function_body(&result.source, "export function __entry_setOrigin(");
    assert!(entry.contains("const __a_p = Point_decode(input, 4, 4 + 0);"));
    assert!(entry.contains("const __a_to = Abi.decodeAddress(input, 4 + 64);"));

    let decode = function_body(&result.source, "function Point_decode(");
    assert!(decode.contains("const start: u32 = at;"));
    assert!(decode.contains("Abi.decodeU256(input, start + 0)"));
    assert!(decode.contains("Abi.decodeU256(input, start + 32)"));

    let json: serde_json::Value = serde_json::from_str(&result.abi_json).unwrap();
    assert_eq!(json[1]["inputs"][0]["type"], "tuple");
    assert_eq!(json[1]["inputs"][1]["type"], "address");
}

#[test]
fn test_signed_storage_with_plain_literals() {
    let source = r#"
        @Contract
        export class Balance {
          v: I256;

          @External
          step(): void {
            this.v = this.v.add(1);
            if (this.v.lessThan(0)) {
              this.v = this.v.add(2);
            }
          }
        }
    "#;
    let mut compiler = compiler(CompileOptions::default());
    let result = compiler.compile_source("balance.ts", source).unwrap();
    assert!(result.diagnostics.is_empty());
    assert!(result.source.contains("I256.fromI64(1)"));
    assert!(result.source.contains("I256.lessThan(load_v(), I256.fromI64(0))"));
}

#[test]
fn test_fail_fast_vs_best_effort() {
    // Writing storage from a view method is a semantic error
    let source = r#"
        @Contract
        export class Broken {
          count: U256;
          @View
          poke(): void { this.count = U256Factory.create(); }
        }
    "#;

    let mut strict = compiler(CompileOptions::default());
    match strict.compile_source("broken.ts", source) {
        Err(Error::ValidationFailed { count, report }) => {
            assert_eq!(count, 1);
            assert!(report.contains("E014"));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|r| r.source)),
    }

    let mut lenient = compiler(CompileOptions::default().validation_mode(ValidationMode::BestEffort));
    let result = lenient.compile_source("broken.ts", source).unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, "E014");
    assert!(result.source.contains("function poke(): void {"));
}

#[test]
fn test_single_contract_required() {
    let mut compiler = compiler(CompileOptions::default().validation_mode(ValidationMode::BestEffort));
    let err = compiler
        .compile_source("two.ts", "@Contract class A { } @Contract class B { }")
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed { .. }));
}

#[test]
fn test_entrypoint_and_runtime_options() {
    let options = CompileOptions::default()
        .emit_entrypoint(false)
        .runtime_module("./runtime/index");
    let mut compiler = compiler(options);
    let result = compiler.compile_source("counter.ts", COUNTER).unwrap();
    assert!(!result.source.contains("user_entrypoint"));
    assert!(result.source.contains("from \"./runtime/index\";"));
}

#[test]
fn test_selectors_are_hex_words() {
    assert_eq!(to_hex(&selector("transfer(address,uint256)")), "0xa9059cbb");
}
