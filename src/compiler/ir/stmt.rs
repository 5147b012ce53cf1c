use serde::{Deserialize, Serialize};

use super::expr::IrExpr;
use super::types::{SemType, VarScope};

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    /// Local variable or storage field
    Var {
        /// Variable name
        name: String,
        /// Memory or storage
        scope: VarScope,
        /// Declared type
        ty: SemType,
    },
    /// Struct field (of a memory struct or a storage struct)
    Field {
        /// Struct-typed base
        base: IrExpr,
        /// Field name
        field: String,
        /// Field type
        ty: SemType,
    },
}

impl AssignTarget {
    /// Type of the assigned location
    pub fn ty(&self) -> &SemType {
        match self {
            AssignTarget::Var { ty, .. } | AssignTarget::Field { ty, .. } => ty,
        }
    }

    /// Whether the assignment writes storage
    pub fn is_storage(&self) -> bool {
        match self {
            AssignTarget::Var { scope, .. } => *scope == VarScope::Storage,
            AssignTarget::Field { base, .. } => base.scope() == VarScope::Storage,
        }
    }
}

/// IR statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrStmt {
    /// Local declaration
    Let {
        /// Variable name
        name: String,
        /// Declared type
        ty: SemType,
        /// Initial value
        init: Option<IrExpr>,
    },
    /// Assignment
    Assign {
        /// Target location
        target: AssignTarget,
        /// Assigned value
        value: IrExpr,
    },
    /// Expression evaluated for effect
    Expr(IrExpr),
    /// Return from the method
    Return(Option<IrExpr>),
    /// Conditional
    If {
        /// Boolean condition
        condition: IrExpr,
        /// Then branch
        then_branch: Vec<IrStmt>,
        /// Else branch
        else_branch: Option<Vec<IrStmt>>,
    },
    /// C-style loop
    For {
        /// Initializer
        init: Option<Box<IrStmt>>,
        /// Condition; `None` loops forever
        condition: Option<IrExpr>,
        /// Update step
        update: Option<Box<IrStmt>>,
        /// Body
        body: Vec<IrStmt>,
    },
    /// Pre-tested loop
    While {
        /// Condition
        condition: IrExpr,
        /// Body
        body: Vec<IrStmt>,
    },
    /// Post-tested loop
    DoWhile {
        /// Body
        body: Vec<IrStmt>,
        /// Condition
        condition: IrExpr,
    },
    /// Nested scope
    Block(Vec<IrStmt>),
    /// Abort with custom error data
    Revert {
        /// Error declaration name
        error: String,
        /// Error arguments
        args: Vec<IrExpr>,
    },
}

impl IrStmt {
    /// Whether every path through the statement ends in `return` or `revert`
    pub fn always_exits(&self) -> bool {
        match self {
            IrStmt::Return(_) | IrStmt::Revert { .. } => true,
            IrStmt::Block(stmts) => stmts.iter().any(IrStmt::always_exits),
            IrStmt::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                then_branch.iter().any(IrStmt::always_exits)
                    && else_branch.iter().any(IrStmt::always_exits)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_without_else_does_not_exit() {
        let stmt = IrStmt::If {
            condition: IrExpr::boolean(true),
            then_branch: vec![IrStmt::Return(None)],
            else_branch: None,
        };
        assert!(!stmt.always_exits());
    }

    #[test]
    fn test_if_with_both_branches_returning_exits() {
        let stmt = IrStmt::If {
            condition: IrExpr::boolean(true),
            then_branch: vec![IrStmt::Return(None)],
            else_branch: Some(vec![IrStmt::Revert {
                error: "Oops".into(),
                args: vec![],
            }]),
        };
        assert!(stmt.always_exits());
    }
}
