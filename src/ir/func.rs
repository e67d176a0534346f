use serde::{Deserialize, Serialize};

use super::stmt::{Statement, Terminator};
use super::ty::{GenericParams, Type};

/// Blocks are referred to by their index in [`Function::blocks`].
pub type BasicBlockId = usize;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BasicBlock {
    #[serde(default)]
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(statements: Vec<Statement>, terminator: Terminator) -> Self {
        Self {
            statements,
            terminator,
        }
    }
}

/// A function body lowered into a control-flow graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Function {
    /// The generic parameters of the enclosing item.
    #[serde(default)]
    pub generics: GenericParams,
    #[serde(default)]
    pub args: Vec<Type>,
    pub ret_ty: Type,
    #[serde(default)]
    pub locals: Vec<Type>,
    #[serde(default)]
    pub drop_flags: Vec<bool>,
    pub blocks: Vec<BasicBlock>,
}
