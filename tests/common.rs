#![allow(dead_code)]

use mirlife::env::{AssocTypeImpl, Crate};
use mirlife::ir::{
    BasicBlock, BorrowType, ConstantDef, CoreType, EnumDef, EnumVariant, Function, GenericParams,
    GenericPath, LValue, NamedField, Param, Path, RValue, SimplePath, Statement, StaticDef,
    StructData, StructDef, Terminator, Type, TypeParamDef, TypePath, TypePathBinding, UnionDef,
};

pub const FN_PATH: &str = "::demo::f";

pub fn path(components: &[&str]) -> SimplePath {
    SimplePath::new(components.iter().copied())
}

pub fn generic(name: &str, binding: u32) -> Type {
    Type::new_generic(name, binding)
}

pub fn item_ty(components: &[&str], params: Vec<Type>, binding: TypePathBinding) -> Type {
    Type::new_path(GenericPath::new(path(components), params), binding)
}

pub fn struct_ty(components: &[&str], params: Vec<Type>) -> Type {
    item_ty(components, params, TypePathBinding::Struct)
}

pub fn enum_ty(components: &[&str], params: Vec<Type>) -> Type {
    item_ty(components, params, TypePathBinding::Enum)
}

pub fn union_ty(components: &[&str], params: Vec<Type>) -> Type {
    item_ty(components, params, TypePathBinding::Union)
}

pub fn box_ty(inner: impl Into<Type>) -> Type {
    struct_ty(&["alloc", "boxed", "Box"], vec![inner.into()])
}

pub fn shared(inner: impl Into<Type>) -> Type {
    Type::new_borrow(BorrowType::Shared, inner)
}

pub fn unique(inner: impl Into<Type>) -> Type {
    Type::new_borrow(BorrowType::Unique, inner)
}

pub fn tuple(tys: Vec<Type>) -> Type {
    Type::Tuple(tys)
}

pub fn prim(ty: CoreType) -> Type {
    ty.into()
}

/// `<ty as ::demo::Assoc>::Output`
pub fn assoc_output(ty: Type) -> Type {
    Type::Path(TypePath {
        path: Path::UfcsKnown {
            ty: Box::new(ty),
            trait_: GenericPath::new(path(&["demo", "Assoc"]), vec![]),
            item: "Output".to_owned(),
            params: Default::default(),
        },
        binding: TypePathBinding::Opaque,
    })
}

/// A small crate exercising every kind of item the resolver looks at.
pub fn demo_crate() -> Crate {
    let t = || generic("T", 0);
    let mut krate = Crate::new();

    krate.add_struct(
        path(&["demo", "Pair"]),
        StructDef {
            params: GenericParams::new(["T"]),
            data: StructData::Named(vec![
                NamedField::new("first", t()),
                NamedField::new("second", CoreType::U32),
            ]),
            is_copy: false,
        },
    );

    krate.add_struct(
        path(&["demo", "Wrapper"]),
        StructDef {
            params: GenericParams::new(["T"]),
            data: StructData::Tuple(vec![t(), assoc_output(t())]),
            is_copy: false,
        },
    );

    krate.add_struct(
        path(&["demo", "Marker"]),
        StructDef {
            params: Default::default(),
            data: StructData::Unit,
            is_copy: true,
        },
    );

    krate.add_struct(
        path(&["demo", "Holder"]),
        StructDef {
            params: GenericParams::new(["T"]),
            data: StructData::Named(vec![
                NamedField::new("items", Type::new_array(t(), 4)),
                NamedField::new("count", CoreType::Usize),
            ]),
            is_copy: true,
        },
    );

    krate.add_enum(
        path(&["core", "option", "Option"]),
        EnumDef {
            params: GenericParams::new(["T"]),
            variants: vec![
                ("None".to_owned(), EnumVariant::Unit),
                ("Some".to_owned(), EnumVariant::Tuple(vec![t()])),
            ],
            is_copy: true,
        },
    );

    krate.add_enum(
        path(&["demo", "Shape"]),
        EnumDef {
            params: GenericParams::new(["T"]),
            variants: vec![
                ("Empty".to_owned(), EnumVariant::Value(7)),
                (
                    "Point".to_owned(),
                    EnumVariant::Struct(vec![NamedField::new("x", t()), NamedField::new("y", t())]),
                ),
                (
                    "Tagged".to_owned(),
                    EnumVariant::Tuple(vec![box_ty(t()), assoc_output(t())]),
                ),
            ],
            is_copy: false,
        },
    );

    krate.add_union(
        path(&["demo", "Bits"]),
        UnionDef {
            params: GenericParams::new(["T"]),
            variants: vec![
                NamedField::new("int", CoreType::U32),
                NamedField::new("val", t()),
            ],
            is_copy: true,
        },
    );

    krate.add_static(
        path(&["demo", "COUNTER"]),
        StaticDef {
            ty: CoreType::Usize.into(),
        },
    );

    krate.add_constant(
        path(&["demo", "LIMIT"]),
        ConstantDef {
            params: Default::default(),
            ty: CoreType::U32.into(),
        },
    );

    krate.add_constant(
        path(&["demo", "DEFAULT"]),
        ConstantDef {
            params: GenericParams::new(["T"]),
            ty: t(),
        },
    );

    krate.add_assoc_type(AssocTypeImpl {
        ty: CoreType::U32.into(),
        trait_: path(&["demo", "Assoc"]),
        name: "Output".to_owned(),
        target: CoreType::U64.into(),
    });

    krate.set_owned_box(path(&["alloc", "boxed", "Box"]));

    krate
}

pub fn copy_param(name: &str) -> GenericParams {
    GenericParams {
        types: vec![TypeParamDef {
            name: name.to_owned(),
            is_copy: true,
        }],
    }
}

pub fn function(args: Vec<Type>, locals: Vec<Type>, blocks: Vec<BasicBlock>) -> Function {
    Function {
        generics: Default::default(),
        args,
        ret_ty: Type::unit(),
        locals,
        drop_flags: vec![],
        blocks,
    }
}

pub fn block(statements: Vec<Statement>, terminator: Terminator) -> BasicBlock {
    BasicBlock::new(statements, terminator)
}

pub fn local(idx: u32) -> LValue {
    LValue::Local(idx)
}

pub fn arg(idx: u32) -> LValue {
    LValue::Argument(idx)
}

pub fn int(v: i64) -> Param {
    Param::Constant(mirlife::ir::Constant::Int {
        v,
        t: CoreType::I32,
    })
}

/// `dst = src` where `src` is moved (or copied) out of.
pub fn assign_use(dst: LValue, src: LValue) -> Statement {
    Statement::assign(dst, RValue::Use(src))
}

/// `dst = <constant>`
pub fn assign_const(dst: LValue, v: i64) -> Statement {
    Statement::assign(
        dst,
        RValue::Constant(mirlife::ir::Constant::Int {
            v,
            t: CoreType::I32,
        }),
    )
}

/// `dst = &val`
pub fn assign_borrow(dst: LValue, val: LValue) -> Statement {
    Statement::assign(
        dst,
        RValue::Borrow {
            region: 0,
            kind: BorrowType::Shared,
            val,
        },
    )
}

/// `dst = a + b`
pub fn assign_add(dst: LValue, a: impl Into<Param>, b: impl Into<Param>) -> Statement {
    Statement::assign(
        dst,
        RValue::BinOp {
            val_l: a.into(),
            op: mirlife::ir::BinOp::Add,
            val_r: b.into(),
        },
    )
}
