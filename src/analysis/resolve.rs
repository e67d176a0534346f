use std::borrow::Cow;

use tracing::instrument;

use crate::env::TypeService;
use crate::errors::{ErrorClass, MirError, MirResult};
use crate::ir::{
    BasicBlock, BasicBlockId, BorrowType, Constant, CoreType, EnumVariant, Function,
    GenericParams, GenericPath, LValue, Param, Path, PathParams, StructData, Type, TypePath,
    TypePathBinding,
};
use crate::position::{Position, StmtIdx};
use crate::{mir_assert, mir_bug, mir_todo};

/// The result of projecting into a type: either a part of the base type itself, or a type
/// derived from an item definition.
enum Projection<'t, 'a> {
    Inner(&'t Type),
    Derived(Cow<'a, Type>),
}

impl<'a> Projection<'a, 'a> {
    fn borrowed(self) -> Cow<'a, Type> {
        match self {
            Self::Inner(ty) => Cow::Borrowed(ty),
            Self::Derived(ty) => ty,
        }
    }
}

impl<'t, 'a> Projection<'t, 'a> {
    fn detached(self) -> Cow<'a, Type> {
        match self {
            Self::Inner(ty) => Cow::Owned(ty.clone()),
            Self::Derived(ty) => ty,
        }
    }
}

macro_rules! project {
    ($base:expr, |$ty:ident| $e:expr) => {
        match $base {
            Cow::Borrowed($ty) => $e?.borrowed(),
            Cow::Owned(ref $ty) => $e?.detached(),
        }
    };
}

/// Type queries over a single function body, plus the position context for diagnostics.
pub struct TypeResolve<'a, S: TypeService + ?Sized> {
    pos: Position,
    fcn: &'a Function,
    service: &'a S,
}

impl<'a, S: TypeService + ?Sized> TypeResolve<'a, S> {
    pub fn new(path: impl Into<String>, fcn: &'a Function, service: &'a S) -> Self {
        Self {
            pos: Position::new(path),
            fcn,
            service,
        }
    }

    pub fn function(&self) -> &'a Function {
        self.fcn
    }

    pub fn service(&self) -> &'a S {
        self.service
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    pub fn set_cur_stmt(&mut self, bb: BasicBlockId, stmt: usize) {
        self.pos.bb = bb;
        self.pos.stmt = StmtIdx::Stmt(stmt);
    }

    pub fn set_cur_stmt_term(&mut self, bb: BasicBlockId) {
        self.pos.bb = bb;
        self.pos.stmt = StmtIdx::Term;
    }

    /// The index of the current statement; the terminator is indexed after the last statement.
    pub fn get_cur_stmt_ofs(&self) -> MirResult<usize> {
        Ok(match self.pos.stmt {
            StmtIdx::Stmt(idx) => idx,
            StmtIdx::Term => self.get_block(self.pos.bb)?.statements.len(),
        })
    }

    pub fn get_block(&self, id: BasicBlockId) -> MirResult<&'a BasicBlock> {
        mir_assert!(
            self,
            id < self.fcn.blocks.len(),
            "Block ID {} out of range",
            id
        );

        Ok(&self.fcn.blocks[id])
    }

    pub fn error(&self, class: ErrorClass, message: String) -> MirError {
        MirError::new(class, self.pos.clone(), message)
    }

    pub fn get_static_type(&self, path: &Path) -> MirResult<&'a Type> {
        match path {
            Path::Generic(path) => {
                if !path.params.is_empty() {
                    mir_bug!(self, "Path params on static - {}", path);
                }

                match self.service.get_static(&path.path) {
                    Some(def) => Ok(&def.ty),
                    None => mir_bug!(self, "Unknown static - {}", path),
                }
            }

            Path::UfcsKnown { .. } => mir_todo!(self, "LValue::Static - UfcsKnown - {}", path),
            Path::UfcsInherent { .. } => {
                mir_todo!(self, "LValue::Static - UfcsInherent - {}", path)
            }
            Path::UfcsUnknown { .. } => {
                mir_bug!(self, "Encountered UfcsUnknown in LValue::Static - {}", path)
            }
        }
    }

    #[instrument(level = "trace", skip(self), ret)]
    pub fn get_lvalue_type(&self, lv: &LValue) -> MirResult<Cow<'a, Type>> {
        Ok(match lv {
            LValue::Return => Cow::Borrowed(&self.fcn.ret_ty),

            LValue::Argument(idx) => match self.fcn.args.get(*idx as usize) {
                Some(ty) => Cow::Borrowed(ty),
                None => mir_bug!(
                    self,
                    "Argument {} out of range ({})",
                    lv,
                    self.fcn.args.len()
                ),
            },

            LValue::Local(idx) => match self.fcn.locals.get(*idx as usize) {
                Some(ty) => Cow::Borrowed(ty),
                None => mir_bug!(
                    self,
                    "Local {} out of range ({})",
                    lv,
                    self.fcn.locals.len()
                ),
            },

            LValue::Static(path) => Cow::Borrowed(self.get_static_type(path)?),

            LValue::Field { val, field_index } => {
                project!(self.get_lvalue_type(val)?, |ty| self
                    .field_type(ty, *field_index))
            }

            LValue::Deref(val) => project!(self.get_lvalue_type(val)?, |ty| self.deref_type(ty)),
            LValue::Index { val, .. } => {
                project!(self.get_lvalue_type(val)?, |ty| self.index_type(ty))
            }

            LValue::Downcast { val, variant_index } => {
                project!(self.get_lvalue_type(val)?, |ty| self
                    .downcast_type(ty, *variant_index))
            }
        })
    }

    pub fn get_param_type(&self, param: &Param) -> MirResult<Cow<'a, Type>> {
        match param {
            Param::LValue(lv) => self.get_lvalue_type(lv),
            Param::Constant(c) => self.get_const_type(c).map(Cow::Owned),
        }
    }

    pub fn get_const_type(&self, c: &Constant) -> MirResult<Type> {
        Ok(match c {
            Constant::Int { t, .. } | Constant::Uint { t, .. } | Constant::Float { t, .. } => {
                Type::Primitive(*t)
            }

            Constant::Bool(_) => CoreType::Bool.into(),
            Constant::Bytes(bytes) => Type::new_borrow(
                BorrowType::Shared,
                Type::new_array(CoreType::U8, bytes.len() as u64),
            ),
            Constant::StaticString(_) => Type::new_borrow(BorrowType::Shared, CoreType::Str),

            Constant::Const { p } => match self.service.get_constant(p) {
                Some(def) if def.ty.mentions_generics() => {
                    mir_todo!(self, "get_const_type - Monomorphise type {}", def.ty)
                }

                Some(def) => def.ty.clone(),
                None => mir_bug!(self, "get_const_type - Not a constant"),
            },

            Constant::ItemAddr(_) => {
                mir_todo!(self, "get_const_type - Get type for constant `{}`", c)
            }
        })
    }

    pub fn is_type_owned_box<'t>(&self, ty: &'t Type) -> Option<&'t Type> {
        self.service.is_owned_box(ty)
    }

    pub fn type_is_copy(&self, ty: &Type) -> bool {
        self.service.is_copy(&self.fcn.generics, ty)
    }

    fn generic_path<'t>(&self, ty: &'t Type, path: &'t Path) -> MirResult<&'t GenericPath> {
        match path.as_generic() {
            Some(path) => Ok(path),
            None => mir_bug!(self, "Item type with a non-generic path - {}", ty),
        }
    }

    /// Substitutes the item's parameters into a declared field type, if it mentions any.
    fn monomorph(
        &self,
        params: &GenericParams,
        bindings: &PathParams,
        ty: &'a Type,
    ) -> Cow<'a, Type> {
        if ty.mentions_generics() {
            let ty = self.service.substitute(params, bindings, ty);

            Cow::Owned(self.service.normalize_associated_types(ty))
        } else {
            Cow::Borrowed(ty)
        }
    }

    fn field_type<'t>(&self, ty: &'t Type, field_index: u32) -> MirResult<Projection<'t, 'a>> {
        let idx = field_index as usize;

        let TypePath { path, binding } = match ty {
            // constant-index accesses are lowered to fields
            Type::Array { inner, .. } | Type::Slice(inner) => return Ok(Projection::Inner(inner)),

            Type::Tuple(tys) => match tys.get(idx) {
                Some(ty) => return Ok(Projection::Inner(ty)),
                None => mir_bug!(
                    self,
                    "Field index out of range in tuple {} >= {}",
                    field_index,
                    tys.len()
                ),
            },

            Type::Path(ty) => ty,
            _ => mir_bug!(self, "Field access on unexpected type - {}", ty),
        };

        match binding {
            TypePathBinding::Struct => {
                let path = self.generic_path(ty, path)?;
                let Some(def) = self.service.get_struct(&path.path) else {
                    mir_bug!(self, "Unknown struct - {}", path);
                };

                let field_ty = match &def.data {
                    StructData::Unit => mir_bug!(self, "Field on unit-like struct - {}", ty),

                    StructData::Tuple(fields) => match fields.get(idx) {
                        Some(ty) => ty,
                        None => mir_bug!(self, "Field index out of range in tuple-struct {}", path),
                    },

                    StructData::Named(fields) => match fields.get(idx) {
                        Some(field) => &field.ty,
                        None => mir_bug!(self, "Field index out of range in struct {}", path),
                    },
                };

                Ok(Projection::Derived(self.monomorph(
                    &def.params,
                    &path.params,
                    field_ty,
                )))
            }

            TypePathBinding::Union => {
                let path = self.generic_path(ty, path)?;
                let Some(def) = self.service.get_union(&path.path) else {
                    mir_bug!(self, "Unknown union - {}", path);
                };

                match def.variants.get(idx) {
                    Some(field) => Ok(Projection::Derived(self.monomorph(
                        &def.params,
                        &path.params,
                        &field.ty,
                    ))),

                    None => mir_bug!(self, "Field index out of range for union {}", path),
                }
            }

            _ => mir_bug!(self, "Field access on invalid type - {}", ty),
        }
    }

    fn deref_type<'t>(&self, ty: &'t Type) -> MirResult<Projection<'t, 'a>> {
        match ty {
            Type::Path(_) => match self.is_type_owned_box(ty) {
                Some(inner) => Ok(Projection::Inner(inner)),
                None => mir_bug!(self, "Deref on unexpected type - {}", ty),
            },

            Type::Pointer { inner, .. } | Type::Borrow { inner, .. } => {
                Ok(Projection::Inner(inner))
            }

            _ => mir_bug!(self, "Deref on unexpected type - {}", ty),
        }
    }

    fn index_type<'t>(&self, ty: &'t Type) -> MirResult<Projection<'t, 'a>> {
        match ty {
            Type::Array { inner, .. } | Type::Slice(inner) => Ok(Projection::Inner(inner)),
            _ => mir_bug!(self, "Index on unexpected type - {}", ty),
        }
    }

    fn downcast_type<'t>(&self, ty: &'t Type, variant_index: u32) -> MirResult<Projection<'t, 'a>> {
        let idx = variant_index as usize;

        let TypePath { path, binding } = match ty {
            Type::Path(ty) => ty,
            _ => mir_bug!(self, "Downcast on unexpected type - {}", ty),
        };

        match binding {
            TypePathBinding::Enum => {
                let path = self.generic_path(ty, path)?;
                let Some(def) = self.service.get_enum(&path.path) else {
                    mir_bug!(self, "Unknown enum - {}", path);
                };

                let fields: Vec<&Type> = match def.variants.get(idx) {
                    Some((_, EnumVariant::Unit | EnumVariant::Value(_))) => {
                        return Ok(Projection::Derived(Cow::Owned(Type::unit())))
                    }

                    Some((_, EnumVariant::Tuple(fields))) => fields.iter().collect(),
                    Some((_, EnumVariant::Struct(fields))) => {
                        fields.iter().map(|field| &field.ty).collect()
                    }

                    None => mir_bug!(
                        self,
                        "Variant index out of range ({} >= {}) in {}",
                        variant_index,
                        def.variants.len(),
                        path
                    ),
                };

                // the variant's fields as an anonymous tuple
                let tys = fields
                    .into_iter()
                    .map(|field| self.service.substitute(&def.params, &path.params, field))
                    .collect();

                Ok(Projection::Derived(Cow::Owned(
                    self.service.normalize_associated_types(Type::Tuple(tys)),
                )))
            }

            TypePathBinding::Union => {
                let path = self.generic_path(ty, path)?;
                let Some(def) = self.service.get_union(&path.path) else {
                    mir_bug!(self, "Unknown union - {}", path);
                };

                match def.variants.get(idx) {
                    Some(field) => Ok(Projection::Derived(self.monomorph(
                        &def.params,
                        &path.params,
                        &field.ty,
                    ))),

                    None => mir_bug!(
                        self,
                        "Variant index out of range ({} >= {}) in {}",
                        variant_index,
                        def.variants.len(),
                        path
                    ),
                }
            }

            _ => Err(self.error(
                ErrorClass::Assert,
                format!("Downcast on non-Enum - {}", ty),
            )),
        }
    }
}
