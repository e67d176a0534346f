use serde::{Deserialize, Serialize};

use super::func::BasicBlockId;
use super::lvalue::{Constant, LValue, Param};
use super::ty::{BorrowType, GenericPath, Path, PathParams, Type};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniOp {
    Inv,
    Neg,
}

/// A value expression: the right-hand side of an assignment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RValue {
    Use(LValue),
    Constant(Constant),

    SizedArray {
        val: Param,
        count: u64,
    },

    Borrow {
        region: u32,
        kind: BorrowType,
        val: LValue,
    },

    Cast {
        val: LValue,
        ty: Type,
    },

    BinOp {
        val_l: Param,
        op: BinOp,
        val_r: Param,
    },

    UniOp {
        val: LValue,
        op: UniOp,
    },

    /// Extracts the metadata of a fat pointer.
    DstMeta {
        val: LValue,
    },

    /// Extracts the data pointer of a fat pointer.
    DstPtr {
        val: LValue,
    },

    MakeDst {
        ptr_val: Param,
        meta_val: Param,
    },

    Tuple {
        vals: Vec<Param>,
    },

    Array {
        vals: Vec<Param>,
    },

    Variant {
        path: GenericPath,
        index: u32,
        val: Param,
    },

    Struct {
        path: GenericPath,
        vals: Vec<Param>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropKind {
    /// Drops the value without running its destructor's inner drops.
    Shallow,
    Deep,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Statement {
    Assign {
        dst: LValue,
        src: RValue,
    },

    Asm {
        tpl: String,
        #[serde(default)]
        outputs: Vec<(String, LValue)>,
        #[serde(default)]
        inputs: Vec<(String, LValue)>,
        #[serde(default)]
        clobbers: Vec<String>,
        #[serde(default)]
        flags: Vec<String>,
    },

    SetDropFlag {
        idx: u32,
        new_val: bool,
        #[serde(default)]
        other: Option<u32>,
    },

    Drop {
        kind: DropKind,
        slot: LValue,
        #[serde(default)]
        flag_idx: Option<u32>,
    },

    ScopeEnd {
        #[serde(default)]
        slots: Vec<u32>,
    },
}

impl Statement {
    pub fn assign(dst: LValue, src: RValue) -> Self {
        Self::Assign { dst, src }
    }

    pub fn drop(slot: LValue) -> Self {
        Self::Drop {
            kind: DropKind::Deep,
            slot,
            flag_idx: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CallTarget {
    Value(LValue),
    Path(Path),

    Intrinsic {
        name: String,
        #[serde(default)]
        params: PathParams,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Terminator {
    /// The lowering stage never finished this block.
    Incomplete,
    Return,
    Diverge,
    Goto(BasicBlockId),

    Panic {
        dst: BasicBlockId,
    },

    If {
        cond: LValue,
        bb0: BasicBlockId,
        bb1: BasicBlockId,
    },

    Switch {
        val: LValue,
        targets: Vec<BasicBlockId>,
    },

    Call {
        ret_block: BasicBlockId,
        panic_block: BasicBlockId,
        ret_val: LValue,
        fcn: CallTarget,
        args: Vec<Param>,
    },
}

impl Terminator {
    /// The blocks control may transfer to, in declaration order.
    pub fn successors(&self) -> Vec<BasicBlockId> {
        match self {
            Self::Incomplete | Self::Return | Self::Diverge => vec![],
            Self::Goto(target) => vec![*target],
            Self::Panic { dst } => vec![*dst],
            Self::If { bb0, bb1, .. } => vec![*bb0, *bb1],
            Self::Switch { targets, .. } => targets.clone(),

            Self::Call {
                ret_block,
                panic_block,
                ..
            } => vec![*ret_block, *panic_block],
        }
    }
}
