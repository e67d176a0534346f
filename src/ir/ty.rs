use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreType {
    Usize,
    Isize,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    F32,
    F64,
    Bool,
    Char,
    Str,
}

impl CoreType {
    /// `str` is the only unsized primitive; everything else is plain data.
    pub fn is_copy(self) -> bool {
        !matches!(self, Self::Str)
    }
}

impl Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Usize => "usize",
                Self::Isize => "isize",
                Self::U8 => "u8",
                Self::I8 => "i8",
                Self::U16 => "u16",
                Self::I16 => "i16",
                Self::U32 => "u32",
                Self::I32 => "i32",
                Self::U64 => "u64",
                Self::I64 => "i64",
                Self::U128 => "u128",
                Self::I128 => "i128",
                Self::F32 => "f32",
                Self::F64 => "f64",
                Self::Bool => "bool",
                Self::Char => "char",
                Self::Str => "str",
            }
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorrowType {
    Shared,
    Unique,
    Owned,
}

impl BorrowType {
    fn borrow_prefix(self) -> &'static str {
        match self {
            Self::Shared => "&",
            Self::Unique => "&mut ",
            Self::Owned => "&move ",
        }
    }

    fn pointer_prefix(self) -> &'static str {
        match self {
            Self::Shared => "*const ",
            Self::Unique => "*mut ",
            Self::Owned => "*move ",
        }
    }
}

/// An absolute path to an item, e.g. `::core::option::Option`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SimplePath(pub Vec<String>);

impl SimplePath {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(components.into_iter().map(Into::into).collect())
    }
}

impl Display for SimplePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.0 {
            write!(f, "::{}", component)?;
        }

        Ok(())
    }
}

/// Type arguments supplied to a path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathParams {
    #[serde(default)]
    pub types: Vec<Type>,
}

impl PathParams {
    pub fn new(types: Vec<Type>) -> Self {
        Self { types }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Display for PathParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.types.is_empty() {
            write!(f, "<{}>", self.types.iter().format(", "))?;
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericPath {
    pub path: SimplePath,
    #[serde(default)]
    pub params: PathParams,
}

impl GenericPath {
    pub fn new(path: SimplePath, params: Vec<Type>) -> Self {
        Self {
            path,
            params: PathParams::new(params),
        }
    }
}

impl Display for GenericPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.params)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    Generic(GenericPath),

    /// `<T>::item`
    UfcsInherent {
        ty: Box<Type>,
        item: String,
        #[serde(default)]
        params: PathParams,
    },

    /// `<T as Trait>::item`
    UfcsKnown {
        ty: Box<Type>,
        trait_: GenericPath,
        item: String,
        #[serde(default)]
        params: PathParams,
    },

    /// `<T as _>::item`, where the trait has not been determined yet.
    UfcsUnknown {
        ty: Box<Type>,
        item: String,
        #[serde(default)]
        params: PathParams,
    },
}

impl Path {
    pub fn as_generic(&self) -> Option<&GenericPath> {
        crate::try_match!(self, Self::Generic(path) => path)
    }

    pub fn mentions_generics(&self) -> bool {
        match self {
            Self::Generic(path) => path.params.types.iter().any(Type::mentions_generics),

            Self::UfcsInherent { ty, params, .. } | Self::UfcsUnknown { ty, params, .. } => {
                ty.mentions_generics() || params.types.iter().any(Type::mentions_generics)
            }

            Self::UfcsKnown {
                ty, trait_, params, ..
            } => {
                ty.mentions_generics()
                    || trait_.params.types.iter().any(Type::mentions_generics)
                    || params.types.iter().any(Type::mentions_generics)
            }
        }
    }
}

impl From<GenericPath> for Path {
    fn from(path: GenericPath) -> Self {
        Self::Generic(path)
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic(path) => write!(f, "{}", path),
            Self::UfcsInherent { ty, item, params } => write!(f, "<{}>::{}{}", ty, item, params),

            Self::UfcsKnown {
                ty,
                trait_,
                item,
                params,
            } => write!(f, "<{} as {}>::{}{}", ty, trait_, item, params),

            Self::UfcsUnknown { ty, item, params } => {
                write!(f, "<{} as _>::{}{}", ty, item, params)
            }
        }
    }
}

/// Which kind of item a path type refers to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypePathBinding {
    #[default]
    Unbound,
    Opaque,
    Struct,
    Enum,
    Union,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePath {
    pub path: Path,
    #[serde(default)]
    pub binding: TypePathBinding,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParamDef {
    pub name: String,

    /// Whether the parameter is bounded by `Copy`.
    #[serde(default)]
    pub is_copy: bool,
}

/// The generic parameters declared by an item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GenericParams {
    #[serde(default)]
    pub types: Vec<TypeParamDef>,
}

impl GenericParams {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: names
                .into_iter()
                .map(|name| TypeParamDef {
                    name: name.into(),
                    is_copy: false,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    #[serde(default)]
    pub is_unsafe: bool,
    pub args: Vec<Type>,
    pub ret: Box<Type>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `!`
    Diverge,
    Primitive(CoreType),
    Path(TypePath),

    /// A generic parameter; `binding` indexes the declaring item's [`GenericParams`].
    Generic {
        name: String,
        binding: u32,
    },

    Array {
        inner: Box<Type>,
        size: u64,
    },

    Slice(Box<Type>),
    Tuple(Vec<Type>),

    Borrow {
        kind: BorrowType,
        inner: Box<Type>,
    },

    Pointer {
        kind: BorrowType,
        inner: Box<Type>,
    },

    Function(FunctionType),
}

impl From<CoreType> for Type {
    fn from(ty: CoreType) -> Self {
        Self::Primitive(ty)
    }
}

impl Type {
    pub fn unit() -> Self {
        Self::Tuple(vec![])
    }

    pub fn new_borrow(kind: BorrowType, inner: impl Into<Type>) -> Self {
        Self::Borrow {
            kind,
            inner: Box::new(inner.into()),
        }
    }

    pub fn new_pointer(kind: BorrowType, inner: impl Into<Type>) -> Self {
        Self::Pointer {
            kind,
            inner: Box::new(inner.into()),
        }
    }

    pub fn new_array(inner: impl Into<Type>, size: u64) -> Self {
        Self::Array {
            inner: Box::new(inner.into()),
            size,
        }
    }

    pub fn new_slice(inner: impl Into<Type>) -> Self {
        Self::Slice(Box::new(inner.into()))
    }

    pub fn new_generic(name: impl Into<String>, binding: u32) -> Self {
        Self::Generic {
            name: name.into(),
            binding,
        }
    }

    pub fn new_path(path: impl Into<Path>, binding: TypePathBinding) -> Self {
        Self::Path(TypePath {
            path: path.into(),
            binding,
        })
    }

    /// Whether substituting generic parameters could change this type.
    pub fn mentions_generics(&self) -> bool {
        match self {
            Self::Diverge | Self::Primitive(_) => false,
            Self::Generic { .. } => true,
            Self::Path(ty) => ty.path.mentions_generics(),

            Self::Array { inner, .. }
            | Self::Slice(inner)
            | Self::Borrow { inner, .. }
            | Self::Pointer { inner, .. } => inner.mentions_generics(),

            Self::Tuple(tys) => tys.iter().any(Self::mentions_generics),

            Self::Function(ty) => {
                ty.args.iter().any(Self::mentions_generics) || ty.ret.mentions_generics()
            }
        }
    }

    /// Clones the type, replacing every sub-type for which `f` returns `Some`.
    ///
    /// `f` is tried on a node before its children; a replaced node is not descended into.
    pub fn clone_with<F>(&self, f: &mut F) -> Type
    where
        F: FnMut(&Type) -> Option<Type>,
    {
        if let Some(ty) = f(self) {
            return ty;
        }

        match self {
            Self::Diverge => Self::Diverge,
            Self::Primitive(ty) => Self::Primitive(*ty),
            Self::Generic { .. } => self.clone(),

            Self::Path(ty) => Self::Path(TypePath {
                path: clone_path_with(&ty.path, f),
                binding: ty.binding,
            }),

            Self::Array { inner, size } => Self::Array {
                inner: Box::new(inner.clone_with(f)),
                size: *size,
            },

            Self::Slice(inner) => Self::Slice(Box::new(inner.clone_with(f))),
            Self::Tuple(tys) => Self::Tuple(tys.iter().map(|ty| ty.clone_with(f)).collect()),

            Self::Borrow { kind, inner } => Self::Borrow {
                kind: *kind,
                inner: Box::new(inner.clone_with(f)),
            },

            Self::Pointer { kind, inner } => Self::Pointer {
                kind: *kind,
                inner: Box::new(inner.clone_with(f)),
            },

            Self::Function(ty) => Self::Function(FunctionType {
                is_unsafe: ty.is_unsafe,
                args: ty.args.iter().map(|ty| ty.clone_with(f)).collect(),
                ret: Box::new(ty.ret.clone_with(f)),
            }),
        }
    }
}

fn clone_params_with<F>(params: &PathParams, f: &mut F) -> PathParams
where
    F: FnMut(&Type) -> Option<Type>,
{
    PathParams::new(params.types.iter().map(|ty| ty.clone_with(f)).collect())
}

fn clone_generic_path_with<F>(path: &GenericPath, f: &mut F) -> GenericPath
where
    F: FnMut(&Type) -> Option<Type>,
{
    GenericPath {
        path: path.path.clone(),
        params: clone_params_with(&path.params, f),
    }
}

fn clone_path_with<F>(path: &Path, f: &mut F) -> Path
where
    F: FnMut(&Type) -> Option<Type>,
{
    match path {
        Path::Generic(path) => Path::Generic(clone_generic_path_with(path, f)),

        Path::UfcsInherent { ty, item, params } => Path::UfcsInherent {
            ty: Box::new(ty.clone_with(f)),
            item: item.clone(),
            params: clone_params_with(params, f),
        },

        Path::UfcsKnown {
            ty,
            trait_,
            item,
            params,
        } => Path::UfcsKnown {
            ty: Box::new(ty.clone_with(f)),
            trait_: clone_generic_path_with(trait_, f),
            item: item.clone(),
            params: clone_params_with(params, f),
        },

        Path::UfcsUnknown { ty, item, params } => Path::UfcsUnknown {
            ty: Box::new(ty.clone_with(f)),
            item: item.clone(),
            params: clone_params_with(params, f),
        },
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diverge => write!(f, "!"),
            Self::Primitive(ty) => write!(f, "{}", ty),
            Self::Path(ty) => write!(f, "{}", ty.path),
            Self::Generic { name, .. } => write!(f, "{}", name),
            Self::Array { inner, size } => write!(f, "[{}; {}]", inner, size),
            Self::Slice(inner) => write!(f, "[{}]", inner),
            Self::Tuple(tys) if tys.len() == 1 => write!(f, "({},)", tys[0]),
            Self::Tuple(tys) => write!(f, "({})", tys.iter().format(", ")),
            Self::Borrow { kind, inner } => write!(f, "{}{}", kind.borrow_prefix(), inner),
            Self::Pointer { kind, inner } => write!(f, "{}{}", kind.pointer_prefix(), inner),

            Self::Function(ty) => {
                if ty.is_unsafe {
                    write!(f, "unsafe ")?;
                }

                write!(f, "fn({}) -> {}", ty.args.iter().format(", "), ty.ret)
            }
        }
    }
}
