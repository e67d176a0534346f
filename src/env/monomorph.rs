use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ir::{GenericParams, Path, PathParams, SimplePath, Type, TypePath};

/// `<ty as trait_>::name = target`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssocTypeImpl {
    pub ty: Type,
    pub trait_: SimplePath,
    pub name: String,
    pub target: Type,
}

pub fn substitute(params: &GenericParams, bindings: &PathParams, ty: &Type) -> Type {
    if params.types.len() != bindings.types.len() {
        trace!(
            params = params.types.len(),
            bindings = bindings.types.len(),
            "substituting with a mismatched parameter count"
        );
    }

    ty.clone_with(&mut |ty| match ty {
        Type::Generic { binding, .. } => bindings.types.get(*binding as usize).cloned(),
        _ => None,
    })
}

pub fn normalize_associated_types(assoc_types: &[AssocTypeImpl], ty: Type) -> Type {
    expand(assoc_types, &ty, &mut vec![])
}

/// `in_progress` holds the indices of the entries being expanded; a projection that resolves to
/// one of them again is left in place.
fn expand(assoc_types: &[AssocTypeImpl], ty: &Type, in_progress: &mut Vec<usize>) -> Type {
    ty.clone_with(&mut |ty| {
        let Type::Path(TypePath {
            path:
                Path::UfcsKnown {
                    ty: self_ty,
                    trait_,
                    item,
                    ..
                },
            ..
        }) = ty
        else {
            return None;
        };

        let self_ty = expand(assoc_types, self_ty, in_progress);
        let idx = assoc_types.iter().position(|assoc| {
            assoc.ty == self_ty && assoc.trait_ == trait_.path && &assoc.name == item
        })?;

        if in_progress.contains(&idx) {
            trace!(%ty, "left a cyclic associated type in place");

            return None;
        }

        let assoc = &assoc_types[idx];
        trace!(%ty, target = %assoc.target, "expanded an associated type");

        in_progress.push(idx);
        let target = expand(assoc_types, &assoc.target, in_progress);
        in_progress.pop();

        Some(target)
    })
}
