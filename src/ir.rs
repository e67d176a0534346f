//! The mid-level IR: a function body as a graph of basic blocks over typed storage slots.

mod func;
mod item;
mod lvalue;
mod stmt;
mod ty;

pub use func::{BasicBlock, BasicBlockId, Function};
pub use item::{
    ConstantDef, EnumDef, EnumVariant, NamedField, StaticDef, StructData, StructDef, UnionDef,
};
pub use lvalue::{Constant, LValue, Param};
pub use stmt::{BinOp, CallTarget, DropKind, RValue, Statement, Terminator, UniOp};
pub use ty::{
    BorrowType, CoreType, FunctionType, GenericParams, GenericPath, Path, PathParams, SimplePath,
    Type, TypeParamDef, TypePath, TypePathBinding,
};
