//! Typed intermediate representation
//!
//! The IR is produced by the builders in [`crate::compiler::builder`] and
//! consumed by the transformers and the emitter. Every expression carries a
//! resolved [`SemType`]; there is no "unknown" type.

mod contract;
mod expr;
mod stmt;
mod types;

pub use contract::{
    IrConstructor, IrContract, IrErrorDecl, IrErrorField, IrEvent, IrEventField, IrInterface,
    IrInterfaceMethod, IrMethod, IrParam, IrStruct, IrStructField, StorageVariable,
};
pub use expr::{CmpOp, IrExpr, IrExprKind, IrUnaryOp, Literal, LogicOp};
pub use stmt::{AssignTarget, IrStmt};
pub use types::{MethodRole, SemType, StateMutability, VarScope, Visibility, WORD_SIZE};
