use std::fmt::{self, Display};

use byte_string::ByteStr;
use serde::{Deserialize, Serialize};

use super::ty::{CoreType, Path};

/// A place expression: an addressable storage location.
///
/// Composite variants own their base place, so two places are the same storage
/// iff they are structurally equal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LValue {
    Return,
    Argument(u32),
    Local(u32),
    Static(Path),

    Field {
        val: Box<LValue>,
        field_index: u32,
    },

    Deref(Box<LValue>),

    Index {
        val: Box<LValue>,
        idx: Box<LValue>,
    },

    Downcast {
        val: Box<LValue>,
        variant_index: u32,
    },
}

impl LValue {
    pub fn field(self, field_index: u32) -> Self {
        Self::Field {
            val: Box::new(self),
            field_index,
        }
    }

    pub fn deref(self) -> Self {
        Self::Deref(Box::new(self))
    }

    pub fn index(self, idx: LValue) -> Self {
        Self::Index {
            val: Box::new(self),
            idx: Box::new(idx),
        }
    }

    pub fn downcast(self, variant_index: u32) -> Self {
        Self::Downcast {
            val: Box::new(self),
            variant_index,
        }
    }
}

impl Display for LValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return => write!(f, "RETURN"),
            Self::Argument(idx) => write!(f, "a{}", idx),
            Self::Local(idx) => write!(f, "_{}", idx),
            Self::Static(path) => write!(f, "{}", path),
            Self::Field { val, field_index } => write!(f, "{}.{}", val, field_index),
            Self::Deref(val) => write!(f, "(*{})", val),
            Self::Index { val, idx } => write!(f, "{}[{}]", val, idx),
            Self::Downcast { val, variant_index } => write!(f, "({}#{})", val, variant_index),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Constant {
    Int { v: i64, t: CoreType },
    Uint { v: u64, t: CoreType },
    Float { v: f64, t: CoreType },
    Bool(bool),
    Bytes(Vec<u8>),
    StaticString(String),

    /// A reference to a named constant item.
    Const { p: Path },

    /// The address of an item (function or static).
    ItemAddr(Path),
}

impl Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { v, t } => write!(f, "{} {}", v, t),
            Self::Uint { v, t } => write!(f, "{} {}", v, t),
            Self::Float { v, t } => write!(f, "{} {}", v, t),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Bytes(bytes) => write!(f, "{:?}", ByteStr::new(bytes)),
            Self::StaticString(s) => write!(f, "{:?}", s),
            Self::Const { p } => write!(f, "{}", p),
            Self::ItemAddr(p) => write!(f, "&{}", p),
        }
    }
}

/// An operand: either a place or a constant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Param {
    LValue(LValue),
    Constant(Constant),
}

impl From<LValue> for Param {
    fn from(lv: LValue) -> Self {
        Self::LValue(lv)
    }
}

impl From<Constant> for Param {
    fn from(c: Constant) -> Self {
        Self::Constant(c)
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LValue(lv) => write!(f, "{}", lv),
            Self::Constant(c) => write!(f, "{}", c),
        }
    }
}
