//! Accumulated syntax and semantic findings
//!
//! Every finding is looked up in one of two fixed catalogs by a stable code
//! (`S0xx` syntax, `E0xx` semantic). The catalog supplies a message template
//! with positional `{0}`, `{1}` placeholders, a description and a suggested
//! fix. Recording never fails and never deduplicates.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Syntax finding codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxCode {
    /// Source has no declarations
    EmptySource,
    /// No class carries `@Contract`
    NoContract,
    /// More than one class carries `@Contract`
    MultipleContracts,
    /// Declaration without a name
    MissingClassName,
    /// More than one constructor
    MultipleConstructors,
    /// `if` branch is not a block
    NonBlockIfBranch,
    /// Field or parameter without a type
    MissingTypeAnnotation,
}

/// Semantic finding codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticCode {
    /// Type outside the supported set
    UnsupportedType,
    /// Two decorators of the same kind on one method
    MultipleDecorators,
    /// Decorators that cannot be combined
    ConflictingDecorators,
    /// Return type unsupported or not matching the declaration
    InvalidReturnType,
    /// Non-void method may finish without returning
    MissingReturn,
    /// Two methods with one name
    DuplicateMethod,
    /// Name already declared in the same scope
    DuplicateVariable,
    /// More than one parent type
    MultipleInheritance,
    /// Parent type cannot be located
    UnresolvedParent,
    /// Parent chain loops back
    InheritanceCycle,
    /// Struct contains itself
    SelfReferentialStruct,
    /// Structs contain each other
    CyclicStruct,
    /// `if`/loop condition is not boolean
    NonBooleanCondition,
    /// Storage write inside `view`/`pure`
    StorageWriteInReadOnly,
    /// Storage read inside `pure`
    StorageReadInPure,
    /// Call to an exported method from inside the contract
    ExternalSelfCall,
    /// Event with more than three indexed fields
    TooManyIndexedFields,
    /// Storage field redeclares an inherited one
    ShadowedStorage,
    /// Value type differs from the target type
    TypeMismatch,
    /// Struct or event without fields
    MissingFields,
    /// Relative import that cannot be read
    UnresolvedImport,
    /// Inheritance chain deeper than allowed
    InheritanceTooDeep,
}

/// Catalog entry
#[derive(Debug, Clone)]
pub struct ErrorTemplate {
    /// Stable code, e.g. `E004`
    pub code: &'static str,
    /// Message with positional placeholders
    pub message: &'static str,
    /// What the finding means
    pub description: &'static str,
    /// How to fix it
    pub fix: &'static str,
}

impl ErrorTemplate {
    const fn new(
        code: &'static str,
        message: &'static str,
        description: &'static str,
        fix: &'static str,
    ) -> Self {
        ErrorTemplate {
            code,
            message,
            description,
            fix,
        }
    }

    /// Substitutes `{i}` with `args[i]`
    pub fn render(&self, args: &[String]) -> String {
        let mut out = self.message.to_string();
        for (i, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{}}}", i), arg);
        }
        out
    }
}

lazy_static! {
    static ref SYNTAX_CATALOG: HashMap<SyntaxCode, ErrorTemplate> = {
        use SyntaxCode::*;
        let mut m = HashMap::new();
        m.insert(EmptySource, ErrorTemplate::new(
            "S001",
            "Source file is empty",
            "The compilation unit contains no declarations.",
            "Declare a class marked with @Contract.",
        ));
        m.insert(NoContract, ErrorTemplate::new(
            "S002",
            "No contract class found",
            "Exactly one class must be marked with @Contract.",
            "Add @Contract to the class that should be deployed.",
        ));
        m.insert(MultipleContracts, ErrorTemplate::new(
            "S003",
            "Found {0} contract classes: {1}",
            "A source file may declare only one contract.",
            "Move additional contracts into their own files.",
        ));
        m.insert(MissingClassName, ErrorTemplate::new(
            "S004",
            "{0} class is missing a name",
            "Contracts, structs, events and interfaces are referenced by name.",
            "Give the class a name: `export class Name { ... }`.",
        ));
        m.insert(MultipleConstructors, ErrorTemplate::new(
            "S005",
            "Contract '{0}' declares {1} constructors",
            "A contract has at most one constructor.",
            "Merge the constructors into one.",
        ));
        m.insert(NonBlockIfBranch, ErrorTemplate::new(
            "S006",
            "`if` branch must be a block",
            "Branches of an `if` statement must be enclosed in braces.",
            "Wrap the branch in `{ ... }`.",
        ));
        m.insert(MissingTypeAnnotation, ErrorTemplate::new(
            "S007",
            "'{0}' is missing a type annotation",
            "Fields, parameters and uninitialized locals need an explicit type.",
            "Add `: Type` after the name.",
        ));
        m
    };

    static ref SEMANTIC_CATALOG: HashMap<SemanticCode, ErrorTemplate> = {
        use SemanticCode::*;
        let mut m = HashMap::new();
        m.insert(UnsupportedType, ErrorTemplate::new(
            "E001",
            "Unsupported type '{0}'",
            "Only U256, I256, Address, Str, boolean, mappings, arrays, structs and interfaces are supported.",
            "Replace the type with one of the supported types.",
        ));
        m.insert(MultipleDecorators, ErrorTemplate::new(
            "E002",
            "Method '{0}' has multiple {1} decorators",
            "A method carries at most one visibility, one mutability and one role decorator.",
            "Remove the duplicate decorator.",
        ));
        m.insert(ConflictingDecorators, ErrorTemplate::new(
            "E003",
            "Method '{0}': {1}",
            "The decorators on this method cannot be combined.",
            "Remove one of the conflicting decorators.",
        ));
        m.insert(InvalidReturnType, ErrorTemplate::new(
            "E004",
            "Method '{0}' returns {1} but is declared to return {2}",
            "Returned values must match the declared return type.",
            "Change the return type or the returned expression.",
        ));
        m.insert(MissingReturn, ErrorTemplate::new(
            "E005",
            "Method '{0}' may finish without returning a value",
            "Every path through a non-void method must end in `return`.",
            "Add a return statement at the end of the method.",
        ));
        m.insert(DuplicateMethod, ErrorTemplate::new(
            "E006",
            "Method '{0}' is declared more than once",
            "Overloading is not supported.",
            "Rename one of the methods.",
        ));
        m.insert(DuplicateVariable, ErrorTemplate::new(
            "E007",
            "'{0}' is already declared in this scope",
            "Names must be unique within a scope.",
            "Rename the variable.",
        ));
        m.insert(MultipleInheritance, ErrorTemplate::new(
            "E008",
            "Contract '{0}' extends {1} types",
            "A contract may extend at most one parent.",
            "Keep a single parent in the `extends` clause.",
        ));
        m.insert(UnresolvedParent, ErrorTemplate::new(
            "E009",
            "Cannot resolve parent contract '{0}'",
            "The parent must be imported from a relative path that contains a contract.",
            "Import the parent from a relative path, e.g. `import { Base } from \"./base\";`.",
        ));
        m.insert(InheritanceCycle, ErrorTemplate::new(
            "E010",
            "Inheritance cycle through '{0}'",
            "A contract cannot (indirectly) extend itself.",
            "Break the cycle in the `extends` chain.",
        ));
        m.insert(SelfReferentialStruct, ErrorTemplate::new(
            "E011",
            "Struct '{0}' contains itself through field '{1}'",
            "A struct cannot hold a field of its own type.",
            "Store an identifier or address instead.",
        ));
        m.insert(CyclicStruct, ErrorTemplate::new(
            "E012",
            "Structs form a cycle: {0}",
            "Structs cannot contain each other.",
            "Remove one of the fields that closes the cycle.",
        ));
        m.insert(NonBooleanCondition, ErrorTemplate::new(
            "E013",
            "Condition has type {0}, expected boolean",
            "Conditions must be boolean expressions.",
            "Use a comparison such as `x.greaterThan(y)`.",
        ));
        m.insert(StorageWriteInReadOnly, ErrorTemplate::new(
            "E014",
            "{0} method '{1}' writes storage field '{2}'",
            "View and pure methods cannot modify storage.",
            "Remove the write or drop the @View/@Pure decorator.",
        ));
        m.insert(StorageReadInPure, ErrorTemplate::new(
            "E015",
            "Pure method '{0}' reads storage field '{1}'",
            "Pure methods cannot read storage.",
            "Mark the method @View instead.",
        ));
        m.insert(ExternalSelfCall, ErrorTemplate::new(
            "E016",
            "Cannot call exported method '{0}' from inside the contract",
            "Only @Internal methods can be called through `this`.",
            "Move the shared logic into an @Internal helper.",
        ));
        m.insert(TooManyIndexedFields, ErrorTemplate::new(
            "E017",
            "Event '{0}' has {1} indexed fields",
            "At most three event fields can be indexed.",
            "Remove @Indexed from some fields.",
        ));
        m.insert(ShadowedStorage, ErrorTemplate::new(
            "E018",
            "Storage field '{0}' shadows an inherited field",
            "Inherited storage layout cannot be redeclared.",
            "Rename the field.",
        ));
        m.insert(TypeMismatch, ErrorTemplate::new(
            "E019",
            "Cannot assign {1} to '{0}' of type {2}",
            "The value type differs from the target type.",
            "Convert the value or change the declaration.",
        ));
        m.insert(MissingFields, ErrorTemplate::new(
            "E020",
            "{0} '{1}' declares no fields",
            "Structs and events need at least one field.",
            "Add a field or remove the declaration.",
        ));
        m.insert(UnresolvedImport, ErrorTemplate::new(
            "E021",
            "Cannot resolve import '{0}': {1}",
            "Relative imports must point to readable source files.",
            "Fix the import path.",
        ));
        m.insert(InheritanceTooDeep, ErrorTemplate::new(
            "E022",
            "Inheritance chain of '{0}' exceeds {1} levels",
            "The configured inheritance depth limit was reached.",
            "Flatten the hierarchy or raise `max_inheritance_depth`.",
        ));
        m
    };
}

/// Which catalog a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Structural problem in the source
    Syntax,
    /// Meaning-level problem
    Semantic,
}

/// A recorded finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Syntax or semantic
    pub kind: DiagnosticKind,
    /// Stable code
    pub code: String,
    /// Rendered message
    pub message: String,
    /// Catalog description
    pub description: String,
    /// Suggested fix
    pub fix: String,
    /// Source file
    pub file: String,
    /// Source line
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}\n  help: {}",
            self.file, self.line, self.code, self.message, self.fix
        )
    }
}

/// Accumulator for findings of one compilation unit
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsManager {
    syntax: Vec<Diagnostic>,
    semantic: Vec<Diagnostic>,
}

impl DiagnosticsManager {
    /// Creates an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a syntax finding
    pub fn add_syntax_error(&mut self, code: SyntaxCode, file: &str, line: usize, args: &[String]) {
        let template = &SYNTAX_CATALOG[&code];
        self.syntax
            .push(Self::make(DiagnosticKind::Syntax, template, file, line, args));
    }

    /// Records a semantic finding
    pub fn add_semantic_error(
        &mut self,
        code: SemanticCode,
        file: &str,
        line: usize,
        args: &[String],
    ) {
        let template = &SEMANTIC_CATALOG[&code];
        self.semantic
            .push(Self::make(DiagnosticKind::Semantic, template, file, line, args));
    }

    fn make(
        kind: DiagnosticKind,
        template: &ErrorTemplate,
        file: &str,
        line: usize,
        args: &[String],
    ) -> Diagnostic {
        Diagnostic {
            kind,
            code: template.code.to_string(),
            message: template.render(args),
            description: template.description.to_string(),
            fix: template.fix.to_string(),
            file: file.to_string(),
            line,
        }
    }

    /// Syntax findings in recording order
    pub fn syntax_errors(&self) -> &[Diagnostic] {
        &self.syntax
    }

    /// Semantic findings in recording order
    pub fn semantic_errors(&self) -> &[Diagnostic] {
        &self.semantic
    }

    /// All findings, syntax first
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.syntax
            .iter()
            .chain(self.semantic.iter())
            .cloned()
            .collect()
    }

    /// Whether anything was recorded
    pub fn has_errors(&self) -> bool {
        !self.syntax.is_empty() || !self.semantic.is_empty()
    }

    /// Number of findings
    pub fn len(&self) -> usize {
        self.syntax.len() + self.semantic.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// Folds another unit's findings (e.g. a parent contract) into this one
    pub fn extend(&mut self, other: &DiagnosticsManager) {
        self.syntax.extend(other.syntax.iter().cloned());
        self.semantic.extend(other.semantic.iter().cloned());
    }

    /// Renders every finding, one per block, with file and line
    pub fn render_report(&self) -> String {
        self.errors()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_renders_positional_args() {
        let mut diags = DiagnosticsManager::new();
        diags.add_syntax_error(
            SyntaxCode::MultipleContracts,
            "token.ts",
            3,
            &["2".to_string(), "A, B".to_string()],
        );
        let d = &diags.syntax_errors()[0];
        assert_eq!(d.code, "S003");
        assert_eq!(d.message, "Found 2 contract classes: A, B");
        assert_eq!(d.line, 3);
    }

    #[test]
    fn test_no_deduplication() {
        let mut diags = DiagnosticsManager::new();
        for _ in 0..2 {
            diags.add_semantic_error(SemanticCode::DuplicateMethod, "a.ts", 7, &["f".to_string()]);
        }
        assert_eq!(diags.semantic_errors().len(), 2);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_report_lists_file_and_line() {
        let mut diags = DiagnosticsManager::new();
        diags.add_syntax_error(SyntaxCode::EmptySource, "empty.ts", 1, &[]);
        diags.add_semantic_error(
            SemanticCode::UnsupportedType,
            "empty.ts",
            4,
            &["any".to_string()],
        );
        let report = diags.render_report();
        assert!(report.contains("empty.ts:1: [S001]"));
        assert!(report.contains("empty.ts:4: [E001] Unsupported type 'any'"));
    }

    #[test]
    fn test_every_code_has_a_catalog_entry() {
        use SemanticCode::*;
        let all = [
            UnsupportedType,
            MultipleDecorators,
            ConflictingDecorators,
            InvalidReturnType,
            MissingReturn,
            DuplicateMethod,
            DuplicateVariable,
            MultipleInheritance,
            UnresolvedParent,
            InheritanceCycle,
            SelfReferentialStruct,
            CyclicStruct,
            NonBooleanCondition,
            StorageWriteInReadOnly,
            StorageReadInPure,
            ExternalSelfCall,
            TooManyIndexedFields,
            ShadowedStorage,
            TypeMismatch,
            MissingFields,
            UnresolvedImport,
            InheritanceTooDeep,
        ];
        for code in all {
            assert!(SEMANTIC_CATALOG.contains_key(&code), "{:?}", code);
        }
        assert_eq!(SYNTAX_CATALOG.len(), 7);
    }
}
