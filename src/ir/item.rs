//! Item definitions the resolver consults when projecting into paths.

use serde::{Deserialize, Serialize};

use super::ty::{GenericParams, Type};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedField {
    pub name: String,
    pub ty: Type,
}

impl NamedField {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum StructData {
    Unit,
    Tuple(Vec<Type>),
    Named(Vec<NamedField>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    #[serde(default)]
    pub params: GenericParams,
    pub data: StructData,
    #[serde(default)]
    pub is_copy: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EnumVariant {
    Unit,

    /// A data-less variant with an explicit discriminant.
    Value(i64),

    Tuple(Vec<Type>),
    Struct(Vec<NamedField>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    #[serde(default)]
    pub params: GenericParams,
    pub variants: Vec<(String, EnumVariant)>,
    #[serde(default)]
    pub is_copy: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnionDef {
    #[serde(default)]
    pub params: GenericParams,
    pub variants: Vec<NamedField>,
    #[serde(default)]
    pub is_copy: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StaticDef {
    pub ty: Type,
}

/// The signature of a named constant; its value is never needed here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConstantDef {
    #[serde(default)]
    pub params: GenericParams,
    pub ty: Type,
}
