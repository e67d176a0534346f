//! A traversal over every place occurring in the IR, classifying how each one is used.

use crate::env::TypeService;
use crate::ir::{CallTarget, LValue, Param, RValue, Statement, Terminator};

use super::TypeResolve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValUsage {
    Read,
    Write,
    Move,
    Borrow,
}

pub trait LValueVisitor {
    /// Called for every place occurrence, outermost first.
    ///
    /// Returning `true` stops the descent into the place's base.
    fn visit_lvalue(&mut self, lv: &LValue, usage: ValUsage) -> bool;
}

impl<F> LValueVisitor for F
where
    F: FnMut(&LValue, ValUsage) -> bool,
{
    fn visit_lvalue(&mut self, lv: &LValue, usage: ValUsage) -> bool {
        self(lv, usage)
    }
}

/// Visits `lv` and the places it is built from.
///
/// Returns `true` if any callback invocation returned `true`.
pub fn visit_lvalue<V>(lv: &LValue, usage: ValUsage, visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    if visitor.visit_lvalue(lv, usage) {
        return true;
    }

    match lv {
        LValue::Return | LValue::Argument(_) | LValue::Local(_) | LValue::Static(_) => false,
        LValue::Field { val, .. } | LValue::Downcast { val, .. } => {
            visit_lvalue(val, usage, visitor)
        }

        // computing the address reads the pointer
        LValue::Deref(val) => visit_lvalue(val, ValUsage::Read, visitor),

        LValue::Index { val, idx } => {
            let mut rv = false;
            rv |= visit_lvalue(val, usage, visitor);
            rv |= visit_lvalue(idx, ValUsage::Read, visitor);

            rv
        }
    }
}

/// Visits an operand: the place itself as a `Move`, then the whole place with `usage`.
pub fn visit_param<V>(param: &Param, usage: ValUsage, visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    match param {
        Param::LValue(lv) => {
            if visitor.visit_lvalue(lv, ValUsage::Move) {
                return true;
            }

            visit_lvalue(lv, usage, visitor)
        }

        Param::Constant(_) => false,
    }
}

fn visit_params<V>(params: &[Param], visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    let mut rv = false;

    for param in params {
        rv |= visit_param(param, ValUsage::Read, visitor);
    }

    rv
}

pub fn visit_rvalue<V>(rvalue: &RValue, visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    match rvalue {
        RValue::Use(lv) => {
            if visitor.visit_lvalue(lv, ValUsage::Move) {
                return true;
            }

            visit_lvalue(lv, ValUsage::Read, visitor)
        }

        RValue::Constant(_) => false,
        RValue::SizedArray { val, .. } | RValue::Variant { val, .. } => {
            visit_param(val, ValUsage::Read, visitor)
        }
        RValue::Borrow { val, .. } => visit_lvalue(val, ValUsage::Borrow, visitor),

        RValue::Cast { val, .. }
        | RValue::UniOp { val, .. }
        | RValue::DstMeta { val }
        | RValue::DstPtr { val } => visit_lvalue(val, ValUsage::Read, visitor),

        RValue::BinOp { val_l, val_r, .. } => {
            let mut rv = false;
            rv |= visit_param(val_l, ValUsage::Read, visitor);
            rv |= visit_param(val_r, ValUsage::Read, visitor);

            rv
        }

        RValue::MakeDst { ptr_val, meta_val } => {
            let mut rv = false;
            rv |= visit_param(ptr_val, ValUsage::Read, visitor);
            rv |= visit_param(meta_val, ValUsage::Read, visitor);

            rv
        }

        RValue::Tuple { vals } | RValue::Array { vals } | RValue::Struct { vals, .. } => {
            visit_params(vals, visitor)
        }
    }
}

pub fn visit_statement<V>(stmt: &Statement, visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    let mut rv = false;

    match stmt {
        Statement::Assign { dst, src } => {
            rv |= visit_rvalue(src, visitor);
            rv |= visit_lvalue(dst, ValUsage::Write, visitor);
        }

        Statement::Asm {
            outputs, inputs, ..
        } => {
            for (_, lv) in inputs {
                rv |= visit_lvalue(lv, ValUsage::Read, visitor);
            }

            for (_, lv) in outputs {
                rv |= visit_lvalue(lv, ValUsage::Write, visitor);
            }
        }

        Statement::Drop { slot, .. } => {
            rv |= visit_lvalue(slot, ValUsage::Move, visitor);
        }

        Statement::SetDropFlag { .. } | Statement::ScopeEnd { .. } => {}
    }

    rv
}

pub fn visit_terminator<V>(term: &Terminator, visitor: &mut V) -> bool
where
    V: LValueVisitor + ?Sized,
{
    let mut rv = false;

    match term {
        Terminator::Incomplete
        | Terminator::Return
        | Terminator::Diverge
        | Terminator::Goto(_)
        | Terminator::Panic { .. } => {}

        Terminator::If { cond, .. } => {
            rv |= visit_lvalue(cond, ValUsage::Read, visitor);
        }

        Terminator::Switch { val, .. } => {
            rv |= visit_lvalue(val, ValUsage::Read, visitor);
        }

        Terminator::Call {
            ret_val, fcn, args, ..
        } => {
            if let CallTarget::Value(lv) = fcn {
                rv |= visit_lvalue(lv, ValUsage::Read, visitor);
            }

            rv |= visit_params(args, visitor);
            rv |= visit_lvalue(ret_val, ValUsage::Write, visitor);
        }
    }

    rv
}

/// Visits every statement and terminator in block order, keeping `state`'s position current.
pub fn visit_function<S, V>(state: &mut TypeResolve<'_, S>, visitor: &mut V) -> bool
where
    S: TypeService + ?Sized,
    V: LValueVisitor + ?Sized,
{
    let fcn = state.function();
    let mut rv = false;

    for (bb_idx, bb) in fcn.blocks.iter().enumerate() {
        for (stmt_idx, stmt) in bb.statements.iter().enumerate() {
            state.set_cur_stmt(bb_idx, stmt_idx);
            rv |= visit_statement(stmt, visitor);
        }

        state.set_cur_stmt_term(bb_idx);
        rv |= visit_terminator(&bb.terminator, visitor);
    }

    rv
}
