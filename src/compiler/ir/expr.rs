use serde::{Deserialize, Serialize};

use super::types::{SemType, VarScope};

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer text, decimal or `0x` hex, optional leading `-`
    Int(String),
    /// Text
    Str(String),
    /// Boolean
    Bool(bool),
}

/// Comparison operators carried by `condition` nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
}

impl CmpOp {
    /// Operator for a wide-integer comparison method name
    pub fn from_method(name: &str) -> Option<CmpOp> {
        match name {
            "lessThan" => Some(CmpOp::Lt),
            "greaterThan" => Some(CmpOp::Gt),
            "lessThanOrEqual" => Some(CmpOp::LtEq),
            "greaterThanOrEqual" => Some(CmpOp::GtEq),
            "equals" | "equal" => Some(CmpOp::Eq),
            "notEqual" => Some(CmpOp::NotEq),
            _ => None,
        }
    }

    /// Source spelling
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::LtEq => "<=",
            CmpOp::GtEq => ">=",
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
        }
    }

    /// Runtime comparison method name
    pub fn handler_name(self) -> &'static str {
        match self {
            CmpOp::Lt => "lessThan",
            CmpOp::Gt => "greaterThan",
            CmpOp::LtEq => "lessThanOrEqual",
            CmpOp::GtEq => "greaterThanOrEqual",
            CmpOp::Eq => "equals",
            CmpOp::NotEq => "notEqual",
        }
    }
}

/// Logical operators on booleans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrUnaryOp {
    /// Boolean negation
    Not,
}

/// Typed IR expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrExpr {
    /// Node kind
    pub kind: IrExprKind,
    /// Resolved type of the value
    pub ty: SemType,
}

/// IR expression kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrExprKind {
    /// Constant
    Literal(Literal),
    /// Named variable
    Var {
        /// Variable name
        name: String,
        /// Memory local or storage field
        scope: VarScope,
    },
    /// Operation call; `target` names the operation (`U256.add`, `this.helper`)
    Call {
        /// Operation name
        target: String,
        /// Arguments in order
        args: Vec<IrExpr>,
        /// Receiver, for method-style operations
        receiver: Option<Box<IrExpr>>,
        /// Scope of the receiver
        scope: VarScope,
    },
    /// Struct field read
    Member {
        /// Struct-typed object
        object: Box<IrExpr>,
        /// Field name
        field: String,
    },
    /// Logical combination of two booleans
    Binary {
        /// Operator
        op: LogicOp,
        /// Left operand
        left: Box<IrExpr>,
        /// Right operand
        right: Box<IrExpr>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: IrUnaryOp,
        /// Operand
        operand: Box<IrExpr>,
    },
    /// Comparison
    Condition {
        /// Operator
        op: CmpOp,
        /// Left operand
        left: Box<IrExpr>,
        /// Right operand
        right: Box<IrExpr>,
    },
    /// Single-key mapping read
    MapGet {
        /// Storage variable
        name: String,
        /// Slot of the mapping
        slot: usize,
        /// Key
        key: Box<IrExpr>,
    },
    /// Single-key mapping write
    MapSet {
        /// Storage variable
        name: String,
        /// Slot of the mapping
        slot: usize,
        /// Key
        key: Box<IrExpr>,
        /// Stored value
        value: Box<IrExpr>,
    },
    /// Double-key mapping read
    MapGet2 {
        /// Storage variable
        name: String,
        /// Slot of the mapping
        slot: usize,
        /// Outer key
        key1: Box<IrExpr>,
        /// Inner key
        key2: Box<IrExpr>,
    },
    /// Double-key mapping write
    MapSet2 {
        /// Storage variable
        name: String,
        /// Slot of the mapping
        slot: usize,
        /// Outer key
        key1: Box<IrExpr>,
        /// Inner key
        key2: Box<IrExpr>,
        /// Stored value
        value: Box<IrExpr>,
    },
    /// `[a, b, c]`
    ArrayLiteral(Vec<IrExpr>),
    /// `array[index] = value`
    ArrayAssignment {
        /// Array expression (storage or memory)
        array: Box<IrExpr>,
        /// Element index
        index: Box<IrExpr>,
        /// Stored value
        value: Box<IrExpr>,
    },
    /// Address viewed as an interface
    InterfaceCast {
        /// Interface name
        interface: String,
        /// Target address
        address: Box<IrExpr>,
    },
}

impl IrExpr {
    /// Creates a typed expression
    pub fn new(kind: IrExprKind, ty: SemType) -> Self {
        IrExpr { kind, ty }
    }

    /// Integer literal of the given wide type
    pub fn int(text: impl Into<String>, ty: SemType) -> Self {
        IrExpr::new(IrExprKind::Literal(Literal::Int(text.into())), ty)
    }

    /// Boolean literal
    pub fn boolean(value: bool) -> Self {
        IrExpr::new(IrExprKind::Literal(Literal::Bool(value)), SemType::Bool)
    }

    /// Memory or storage variable reference
    pub fn var(name: impl Into<String>, scope: VarScope, ty: SemType) -> Self {
        IrExpr::new(
            IrExprKind::Var {
                name: name.into(),
                scope,
            },
            ty,
        )
    }

    /// Operation call
    pub fn call(
        target: impl Into<String>,
        receiver: Option<IrExpr>,
        args: Vec<IrExpr>,
        ty: SemType,
    ) -> Self {
        let scope = receiver.as_ref().map(|r| r.scope()).unwrap_or_default();
        IrExpr::new(
            IrExprKind::Call {
                target: target.into(),
                args,
                receiver: receiver.map(Box::new),
                scope,
            },
            ty,
        )
    }

    /// Storage or memory scope of the value's origin
    pub fn scope(&self) -> VarScope {
        match &self.kind {
            IrExprKind::Var { scope, .. } => *scope,
            IrExprKind::Call { scope, .. } => *scope,
            IrExprKind::Member { object, .. } => object.scope(),
            IrExprKind::Condition { left, .. } => left.scope(),
            IrExprKind::MapGet { .. } | IrExprKind::MapGet2 { .. } => VarScope::Storage,
            _ => VarScope::Memory,
        }
    }

    /// Call target, if this is a call
    pub fn call_target(&self) -> Option<&str> {
        match &self.kind {
            IrExprKind::Call { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Whether evaluating the expression writes storage
    pub fn writes_storage(&self) -> bool {
        match &self.kind {
            IrExprKind::MapSet { .. } | IrExprKind::MapSet2 { .. } => true,
            IrExprKind::ArrayAssignment { array, .. } => array.scope() == VarScope::Storage,
            IrExprKind::Call {
                target, receiver, ..
            } => {
                target == "Array.push"
                    && receiver
                        .as_ref()
                        .map(|r| r.scope() == VarScope::Storage)
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_methods_map_one_to_one() {
        let pairs = [
            ("lessThan", "<"),
            ("greaterThan", ">"),
            ("lessThanOrEqual", "<="),
            ("greaterThanOrEqual", ">="),
            ("equals", "=="),
            ("equal", "=="),
            ("notEqual", "!="),
        ];
        for (method, symbol) in pairs {
            assert_eq!(CmpOp::from_method(method).unwrap().symbol(), symbol);
        }
        assert!(CmpOp::from_method("add").is_none());
    }

    #[test]
    fn test_call_inherits_receiver_scope() {
        let recv = IrExpr::var("count", VarScope::Storage, SemType::U256);
        let call = IrExpr::call("U256.add", Some(recv), vec![], SemType::U256);
        assert_eq!(call.scope(), VarScope::Storage);
        assert_eq!(call.call_target(), Some("U256.add"));
    }
}
