use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path label the file was parsed under
    pub path: String,
    /// Import declarations in source order
    pub imports: Vec<ImportDecl>,
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
}

impl SourceFile {
    /// All class declarations, in source order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Class(c) => Some(c),
            Declaration::Const(_) => None,
        })
    }

    /// All `const` declarations, in source order
    pub fn consts(&self) -> impl Iterator<Item = &ConstDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Const(c) => Some(c),
            Declaration::Class(_) => None,
        })
    }

    /// Finds the import that brings `name` into scope
    pub fn import_for(&self, name: &str) -> Option<&ImportDecl> {
        self.imports
            .iter()
            .find(|i| i.names.iter().any(|n| n == name))
    }
}

/// `import { A, B } from "./file";`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Imported names
    pub names: Vec<String>,
    /// Module specifier as written
    pub from: String,
    /// Source line
    pub line: usize,
}

/// `@Name` or `@Name(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decorator {
    /// Decorator name without `@`
    pub name: String,
    /// Arguments, when called
    pub args: Vec<Expr>,
    /// Source line
    pub line: usize,
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    /// Class declaration (contract, struct, event, interface)
    Class(ClassDecl),
    /// `const` declaration (custom errors)
    Const(ConstDecl),
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Class name; `None` for anonymous `export default class { }`
    pub name: Option<String>,
    /// Decorators in source order
    pub decorators: Vec<Decorator>,
    /// Types listed after `extends`
    pub heritage: Vec<String>,
    /// Class body members in source order
    pub members: Vec<ClassMember>,
    /// Whether the class is exported
    pub exported: bool,
    /// Source line
    pub line: usize,
}

impl ClassDecl {
    /// Whether the class carries the given decorator
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d.name == name)
    }

    /// Class name or a placeholder for anonymous classes
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// Constructors declared in the body
    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Constructor(c) => Some(c),
            _ => None,
        })
    }

    /// Properties declared in the body
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Property(p) => Some(p),
            _ => None,
        })
    }

    /// Methods declared in the body
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(m) => Some(m),
            _ => None,
        })
    }
}

/// Class body member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassMember {
    /// Field declaration
    Property(PropertyDecl),
    /// Method declaration
    Method(MethodDecl),
    /// Constructor
    Constructor(ConstructorDecl),
}

/// `@Indexed name: Type = init;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Field name
    pub name: String,
    /// Decorators in source order
    pub decorators: Vec<Decorator>,
    /// Declared type, if annotated
    pub ty: Option<TypeRef>,
    /// Initializer expression, if any
    pub initializer: Option<Expr>,
    /// Declared `static`
    pub is_static: bool,
    /// Source line
    pub line: usize,
}

/// Method declaration; `body` is `None` for interface signatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Decorators in source order
    pub decorators: Vec<Decorator>,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Declared return type, if annotated
    pub return_type: Option<TypeRef>,
    /// Body block
    pub body: Option<Block>,
    /// Declared `static`
    pub is_static: bool,
    /// Source line
    pub line: usize,
}

/// Constructor declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    /// Decorators in source order
    pub decorators: Vec<Decorator>,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Body block
    pub body: Block,
    /// Source line
    pub line: usize,
}

/// `name: Type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type, if annotated
    pub ty: Option<TypeRef>,
    /// Source line
    pub line: usize,
}

/// `export const Name: T = value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    /// Bound name
    pub name: String,
    /// Declared type, if annotated
    pub ty: Option<TypeRef>,
    /// Bound value
    pub value: Expr,
    /// Whether the binding is exported
    pub exported: bool,
    /// Source line
    pub line: usize,
}

/// Type reference as written in source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// `Name` or `Name<Args>`
    Named {
        /// Type name
        name: String,
        /// Generic arguments
        args: Vec<TypeRef>,
    },
    /// `T[]`
    Array(Box<TypeRef>),
    /// `[A, B, C]`
    Tuple(Vec<TypeRef>),
    /// Numeric type argument, as in `StaticArray<U256, 4>`
    Literal(u64),
}

impl TypeRef {
    /// Plain named type without arguments
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: name.to_string(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            TypeRef::Named { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}<{}>", name, args.join(", "))
            }
            TypeRef::Array(inner) => write!(f, "{}[]", inner),
            TypeRef::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|a| a.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            TypeRef::Literal(n) => write!(f, "{}", n),
        }
    }
}

/// `{ ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Statements in order
    pub stmts: Vec<Stmt>,
    /// Line of the opening brace
    pub line: usize,
}

/// Statement with its source line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// Statement kind
    pub kind: StmtKind,
    /// Source line
    pub line: usize,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `let x: T = e;` / `const x = e;`
    VarDecl {
        /// Variable name
        name: String,
        /// `let` (true) or `const` (false)
        mutable: bool,
        /// Declared type, if annotated
        ty: Option<TypeRef>,
        /// Initializer, if any
        init: Option<Expr>,
    },
    /// Expression statement (assignments included)
    Expr(Expr),
    /// `return e;`
    Return(Option<Expr>),
    /// `if (c) s else s`
    If {
        /// Condition
        condition: Expr,
        /// Then branch
        then_branch: Box<Stmt>,
        /// Else branch
        else_branch: Option<Box<Stmt>>,
    },
    /// `for (init; cond; update) body`
    For {
        /// Initializer statement
        init: Option<Box<Stmt>>,
        /// Loop condition
        condition: Option<Expr>,
        /// Update expression
        update: Option<Expr>,
        /// Body
        body: Box<Stmt>,
    },
    /// `while (c) body`
    While {
        /// Loop condition
        condition: Expr,
        /// Body
        body: Box<Stmt>,
    },
    /// `do body while (c);`
    DoWhile {
        /// Body
        body: Box<Stmt>,
        /// Loop condition
        condition: Expr,
    },
    /// Nested block
    Block(Block),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// Lone `;`
    Empty,
}

/// Expression with its source line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Expression kind
    pub kind: ExprKind,
    /// Source line
    pub line: usize,
}

impl Expr {
    /// Creates an expression node
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Expr { kind, line }
    }

    /// Identifier name, if this is a bare identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Short syntactic kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Number(_) => "number literal",
            ExprKind::Str(_) => "string literal",
            ExprKind::Bool(_) => "boolean literal",
            ExprKind::Identifier(_) => "identifier",
            ExprKind::This => "this",
            ExprKind::Call { .. } => "call expression",
            ExprKind::Member { .. } => "member access",
            ExprKind::Index { .. } => "index access",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::ArrayLiteral(_) => "array literal",
            ExprKind::New { .. } => "new expression",
            ExprKind::Conditional { .. } => "conditional expression",
            ExprKind::Object(_) => "object literal",
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Numeric literal as written
    Number(String),
    /// String literal
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// Identifier reference
    Identifier(String),
    /// `this`
    This,
    /// `callee<TypeArgs>(args)`
    Call {
        /// Callee expression
        callee: Box<Expr>,
        /// Explicit type arguments
        type_args: Vec<TypeRef>,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `object.property`
    Member {
        /// Object expression
        object: Box<Expr>,
        /// Property name
        property: String,
    },
    /// `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },
    /// `left op right`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `target op= value`
    Assign {
        /// Compound operator, `None` for plain `=`
        op: Option<BinaryOp>,
        /// Assignment target
        target: Box<Expr>,
        /// Assigned value
        value: Box<Expr>,
    },
    /// `[a, b, c]`
    ArrayLiteral(Vec<Expr>),
    /// `new Class(args)` (parsed, never supported)
    New {
        /// Class name
        class: String,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `c ? a : b` (parsed, never supported)
    Conditional {
        /// Condition
        condition: Box<Expr>,
        /// Value when true
        then_expr: Box<Expr>,
        /// Value when false
        else_expr: Box<Expr>,
    },
    /// `{ key: value }` (parsed, never supported)
    Object(Vec<(String, Expr)>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Equality (==, ===)
    Eq,
    /// Inequality (!=, !==)
    NotEq,
    /// Less than (<)
    Lt,
    /// Greater than (>)
    Gt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than or equal (>=)
    GtEq,
    /// Logical and (&&)
    And,
    /// Logical or (||)
    Or,
}

impl BinaryOp {
    /// Whether this is one of the six comparison operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }

    /// Whether this is an arithmetic operator
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// Source spelling
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical not (!)
    Not,
    /// Negation (-)
    Neg,
}
