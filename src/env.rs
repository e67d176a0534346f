//! The item environment the resolver consults, and a self-contained implementation of it.

mod monomorph;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ir::{
    BorrowType, ConstantDef, EnumDef, Function, GenericParams, Path, PathParams, SimplePath,
    StaticDef, StructDef, Type, TypePathBinding, UnionDef,
};

pub use self::monomorph::{normalize_associated_types, substitute, AssocTypeImpl};

/// The type-resolution service backing the place-type resolver.
///
/// Implementations must be safe to share across concurrently analysed functions; every
/// method takes `&self`.
pub trait TypeService {
    fn get_struct(&self, path: &SimplePath) -> Option<&StructDef>;
    fn get_enum(&self, path: &SimplePath) -> Option<&EnumDef>;
    fn get_union(&self, path: &SimplePath) -> Option<&UnionDef>;
    fn get_static(&self, path: &SimplePath) -> Option<&StaticDef>;

    /// Resolves the signature of a named constant. The value is never evaluated.
    fn get_constant(&self, path: &Path) -> Option<&ConstantDef>;

    /// Replaces every `Generic { binding }` in `ty` with `bindings.types[binding]`.
    fn substitute(&self, params: &GenericParams, bindings: &PathParams, ty: &Type) -> Type;

    /// Expands every `<T as Trait>::Name` in `ty` that has a known definition.
    fn normalize_associated_types(&self, ty: Type) -> Type;

    /// Whether a value of type `ty` can be duplicated without invalidating the source.
    ///
    /// `generics` describes the parameters `Generic` types in `ty` refer to.
    fn is_copy(&self, generics: &GenericParams, ty: &Type) -> bool;

    /// If `ty` is the owned-box lang item, returns the boxed type.
    fn is_owned_box<'t>(&self, ty: &'t Type) -> Option<&'t Type>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Crate {
    #[serde(default)]
    pub structs: IndexMap<SimplePath, StructDef>,
    #[serde(default)]
    pub enums: IndexMap<SimplePath, EnumDef>,
    #[serde(default)]
    pub unions: IndexMap<SimplePath, UnionDef>,
    #[serde(default)]
    pub statics: IndexMap<SimplePath, StaticDef>,
    #[serde(default)]
    pub constants: IndexMap<SimplePath, ConstantDef>,
    #[serde(default)]
    pub assoc_types: Vec<AssocTypeImpl>,

    /// The path of the owned-box lang item, e.g. `::alloc::boxed::Box`.
    #[serde(default)]
    pub owned_box: Option<SimplePath>,
}

fn insert_unique<V>(map: &mut IndexMap<SimplePath, V>, kind: &str, path: SimplePath, def: V) {
    match map.entry(path) {
        Entry::Occupied(entry) => {
            panic!("the {} {} has already been added", kind, entry.key());
        }

        Entry::Vacant(entry) => {
            entry.insert(def);
        }
    }
}

impl Crate {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_struct(&mut self, path: SimplePath, def: StructDef) {
        insert_unique(&mut self.structs, "struct", path, def);
    }

    pub fn add_enum(&mut self, path: SimplePath, def: EnumDef) {
        insert_unique(&mut self.enums, "enum", path, def);
    }

    pub fn add_union(&mut self, path: SimplePath, def: UnionDef) {
        insert_unique(&mut self.unions, "union", path, def);
    }

    pub fn add_static(&mut self, path: SimplePath, def: StaticDef) {
        insert_unique(&mut self.statics, "static", path, def);
    }

    pub fn add_constant(&mut self, path: SimplePath, def: ConstantDef) {
        insert_unique(&mut self.constants, "constant", path, def);
    }

    pub fn add_assoc_type(&mut self, assoc: AssocTypeImpl) {
        self.assoc_types.push(assoc);
    }

    pub fn set_owned_box(&mut self, path: SimplePath) {
        self.owned_box = Some(path);
    }

    fn item_is_copy(&self, binding: TypePathBinding, path: &SimplePath) -> bool {
        match binding {
            TypePathBinding::Struct => self.get_struct(path).map_or(false, |def| def.is_copy),
            TypePathBinding::Enum => self.get_enum(path).map_or(false, |def| def.is_copy),
            TypePathBinding::Union => self.get_union(path).map_or(false, |def| def.is_copy),
            TypePathBinding::Unbound | TypePathBinding::Opaque => false,
        }
    }
}

impl TypeService for Crate {
    fn get_struct(&self, path: &SimplePath) -> Option<&StructDef> {
        self.structs.get(path)
    }

    fn get_enum(&self, path: &SimplePath) -> Option<&EnumDef> {
        self.enums.get(path)
    }

    fn get_union(&self, path: &SimplePath) -> Option<&UnionDef> {
        self.unions.get(path)
    }

    fn get_static(&self, path: &SimplePath) -> Option<&StaticDef> {
        self.statics.get(path)
    }

    fn get_constant(&self, path: &Path) -> Option<&ConstantDef> {
        path.as_generic()
            .and_then(|path| self.constants.get(&path.path))
    }

    fn substitute(&self, params: &GenericParams, bindings: &PathParams, ty: &Type) -> Type {
        substitute(params, bindings, ty)
    }

    fn normalize_associated_types(&self, ty: Type) -> Type {
        normalize_associated_types(&self.assoc_types, ty)
    }

    fn is_copy(&self, generics: &GenericParams, ty: &Type) -> bool {
        match ty {
            Type::Diverge => true,
            Type::Primitive(ty) => ty.is_copy(),
            Type::Generic { binding, .. } => generics
                .types
                .get(*binding as usize)
                .map_or(false, |param| param.is_copy),
            Type::Array { inner, .. } => self.is_copy(generics, inner),
            Type::Slice(_) => false,
            Type::Tuple(tys) => tys.iter().all(|ty| self.is_copy(generics, ty)),
            Type::Borrow { kind, .. } => *kind == BorrowType::Shared,
            Type::Pointer { .. } | Type::Function(_) => true,

            Type::Path(ty) => match ty.path.as_generic() {
                Some(path) => {
                    self.item_is_copy(ty.binding, &path.path)
                        && path
                            .params
                            .types
                            .iter()
                            .all(|ty| self.is_copy(generics, ty))
                }

                None => false,
            },
        }
    }

    fn is_owned_box<'t>(&self, ty: &'t Type) -> Option<&'t Type> {
        let owned_box = self.owned_box.as_ref()?;
        let path = match ty {
            Type::Path(ty) => ty.path.as_generic()?,
            _ => return None,
        };

        match path.params.types.as_slice() {
            [inner] if &path.path == owned_box => Some(inner),
            _ => None,
        }
    }
}

/// A set of function bodies together with the items they refer to.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Program {
    #[serde(rename = "crate", default)]
    pub krate: Crate,
    pub functions: IndexMap<String, Function>,
}
