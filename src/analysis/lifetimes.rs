//! Per-slot liveness: for every local and argument, the program points at which its current
//! value may still be read.

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::env::TypeService;
use crate::errors::MirResult;
use crate::ir::{BasicBlockId, Function, LValue, Statement, Terminator};
use crate::mir_bug;
use crate::position::StmtIdx;

use super::dump::LifetimeObserver;
use super::visit::{visit_lvalue, visit_statement, visit_terminator, LValueVisitor, ValUsage};
use super::TypeResolve;

/// Maps `(block, statement)` pairs to dense program-point indices.
///
/// Blocks are laid out in id order; each block occupies one index per statement plus one for
/// its terminator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockOffsets(Vec<usize>);

impl BlockOffsets {
    pub fn new(fcn: &Function) -> Self {
        let mut statement_count = 0;
        let mut offsets = Vec::with_capacity(fcn.blocks.len() + 1);

        for bb in &fcn.blocks {
            offsets.push(statement_count);
            statement_count += bb.statements.len() + 1;
        }

        offsets.push(statement_count);

        Self(offsets)
    }

    pub fn block_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn statement_count(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    pub fn block_start(&self, bb: BasicBlockId) -> usize {
        self.0[bb]
    }

    /// The in-block index of the terminator of `bb`.
    pub fn block_limit(&self, bb: BasicBlockId) -> usize {
        self.0[bb + 1] - self.0[bb] - 1
    }

    pub fn index_of(&self, bb: BasicBlockId, stmt: StmtIdx) -> usize {
        let limit = self.block_limit(bb);

        match stmt {
            StmtIdx::Stmt(idx) => {
                assert!(idx <= limit, "statement {} is past the end of BB{}", idx, bb);

                self.0[bb] + idx
            }

            StmtIdx::Term => self.0[bb] + limit,
        }
    }

    pub fn is_block_start(&self, idx: usize) -> bool {
        self.0[..self.block_count()].binary_search(&idx).is_ok()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Display for BlockOffsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().format(", "))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueLifetime {
    stmt_bitmap: Vec<bool>,
}

impl ValueLifetime {
    pub fn new(statement_count: usize) -> Self {
        Self {
            stmt_bitmap: vec![false; statement_count],
        }
    }

    /// Marks statements `first..=last` of `bb` as live.
    pub fn fill(&mut self, offsets: &BlockOffsets, bb: BasicBlockId, first: usize, last: usize) {
        let limit = offsets.block_limit(bb);
        trace!("bb{} : {}--{}", bb, first, last);
        assert!(first <= limit, "{} > {} in BB{}", first, limit, bb);
        assert!(last <= limit, "{} > {} in BB{}", last, limit, bb);

        let start = offsets.block_start(bb);

        for stmt in first..=last {
            self.stmt_bitmap[start + stmt] = true;
        }
    }

    pub fn valid_at(&self, idx: usize) -> bool {
        self.stmt_bitmap[idx]
    }

    pub fn bits(&self) -> &[bool] {
        &self.stmt_bitmap
    }

    pub fn is_empty(&self) -> bool {
        !self.stmt_bitmap.contains(&true)
    }
}

/// The lifetimes of every local and argument of a function.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValueLifetimes {
    block_offsets: BlockOffsets,
    slots: Vec<ValueLifetime>,
    args: Vec<ValueLifetime>,
}

impl ValueLifetimes {
    pub fn block_offsets(&self) -> &BlockOffsets {
        &self.block_offsets
    }

    pub fn slots(&self) -> &[ValueLifetime] {
        &self.slots
    }

    pub fn args(&self) -> &[ValueLifetime] {
        &self.args
    }

    pub fn slot(&self, idx: usize) -> &ValueLifetime {
        &self.slots[idx]
    }

    pub fn arg(&self, idx: usize) -> &ValueLifetime {
        &self.args[idx]
    }

    pub fn slot_valid(&self, slot: usize, bb: BasicBlockId, stmt: StmtIdx) -> bool {
        self.slots[slot].valid_at(self.block_offsets.index_of(bb, stmt))
    }

    pub fn arg_valid(&self, arg: usize, bb: BasicBlockId, stmt: StmtIdx) -> bool {
        self.args[arg].valid_at(self.block_offsets.index_of(bb, stmt))
    }
}

/// Where a forward search writes its results.
struct Sink<'r> {
    block_offsets: &'r BlockOffsets,
    vl: &'r mut ValueLifetime,
}

impl Sink<'_> {
    fn fill(&mut self, bb: BasicBlockId, first: usize, last: usize) {
        self.vl.fill(self.block_offsets, bb, first, last);
    }

    fn valid_at_start(&self, bb: BasicBlockId) -> bool {
        self.vl.valid_at(self.block_offsets.block_start(bb))
    }
}

/// One path of a forward search.
#[derive(Debug, Clone)]
struct State {
    /// Blocks entered since the last confirmed read, starting with the block it happened in.
    bb_history: Vec<BasicBlockId>,
    last_read_ofs: usize,
    is_borrowed: bool,
}

impl State {
    fn new(bb_idx: BasicBlockId, stmt_idx: usize) -> Self {
        Self {
            bb_history: vec![bb_idx],
            last_read_ofs: stmt_idx,
            is_borrowed: false,
        }
    }

    fn mark_borrowed(&mut self, sink: &mut Sink<'_>, stmt_idx: usize) {
        if !self.is_borrowed {
            self.fill_to(sink, stmt_idx);
        }

        self.is_borrowed = true;
    }

    fn mark_read(&mut self, sink: &mut Sink<'_>, stmt_idx: usize) {
        if !self.is_borrowed {
            self.fill_to(sink, stmt_idx);
        } else {
            self.is_borrowed = false;
            self.fill_to(sink, stmt_idx);
            self.is_borrowed = true;
        }
    }

    /// Ends the search on this path. A borrowed value stays live up to `stmt_idx`.
    fn finalise(&mut self, sink: &mut Sink<'_>, stmt_idx: usize) {
        if self.is_borrowed {
            self.is_borrowed = false;
            self.fill_to(sink, stmt_idx);
            self.is_borrowed = true;
        }
    }

    fn fill_to(&mut self, sink: &mut Sink<'_>, stmt_idx: usize) {
        trace!(state = %self, stmt_idx, "fill_to");
        assert!(!self.is_borrowed);

        match *self.bb_history.as_slice() {
            [] => unreachable!("the block history is never empty"),
            [bb] => sink.fill(bb, self.last_read_ofs, stmt_idx),

            [first, ref middle @ .., last] => {
                let limit = sink.block_offsets.block_limit(first);
                sink.fill(first, self.last_read_ofs, limit);

                for &bb in middle {
                    let limit = sink.block_offsets.block_limit(bb);
                    sink.fill(bb, 0, limit);
                }

                sink.fill(last, 0, stmt_idx);
            }
        }

        self.last_read_ofs = stmt_idx;

        let cur = self.bb_history[self.bb_history.len() - 1];
        self.bb_history.clear();
        self.bb_history.push(cur);
    }
}

impl Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BB{}/{}--[{}]",
            self.bb_history[0],
            self.last_read_ofs,
            self.bb_history.iter().format(",")
        )
    }
}

/// Watches the occurrences of the tracked place within a single statement or terminator.
struct UseScan<'s, 'r> {
    lv: &'s LValue,
    is_copy: bool,
    stmt_idx: usize,
    state: &'s mut State,
    sink: &'s mut Sink<'r>,
    was_moved: bool,
}

impl LValueVisitor for UseScan<'_, '_> {
    fn visit_lvalue(&mut self, lv: &LValue, usage: ValUsage) -> bool {
        if lv != self.lv {
            return false;
        }

        match usage {
            ValUsage::Read => {
                trace!("used");
                self.state.mark_read(self.sink, self.stmt_idx);
            }

            ValUsage::Move => {
                trace!("{}", if self.is_copy { "read" } else { "moved" });
                self.state.mark_read(self.sink, self.stmt_idx);
                self.was_moved = !self.is_copy;
            }

            ValUsage::Borrow => {
                trace!("borrowed");
                self.state.mark_borrowed(self.sink, self.stmt_idx);
            }

            ValUsage::Write => {}
        }

        true
    }
}

struct Runner<'r, 'a, S: TypeService + ?Sized> {
    mir_res: &'r mut TypeResolve<'a, S>,
    lv: &'r LValue,
    sink: Sink<'r>,
    is_copy: bool,
    visited_statements: Vec<bool>,
    states_to_do: Vec<(BasicBlockId, State)>,
}

impl<S: TypeService + ?Sized> Runner<'_, '_, S> {
    /// Runs `f` over a [`UseScan`]; returns whether the tracked value was moved out.
    fn scan<F>(&mut self, stmt_idx: usize, state: &mut State, f: F) -> bool
    where
        F: FnOnce(&mut UseScan<'_, '_>) -> bool,
    {
        let mut scan = UseScan {
            lv: self.lv,
            is_copy: self.is_copy,
            stmt_idx,
            state,
            sink: &mut self.sink,
            was_moved: false,
        };
        f(&mut scan);

        scan.was_moved
    }

    fn run_block(
        &mut self,
        bb_idx: BasicBlockId,
        mut stmt_idx: usize,
        mut state: State,
    ) -> MirResult<()> {
        let bb = self.mir_res.get_block(bb_idx)?;
        assert!(stmt_idx <= bb.statements.len());
        let block_start = self.sink.block_offsets.block_start(bb_idx);

        while stmt_idx < bb.statements.len() {
            let stmt = &bb.statements[stmt_idx];
            self.mir_res.set_cur_stmt(bb_idx, stmt_idx);
            self.visited_statements[block_start + stmt_idx] = true;

            if self.scan(stmt_idx, &mut state, |scan| visit_statement(stmt, scan)) {
                debug!("{}Moved, return", self.mir_res.position());
                state.mark_read(&mut self.sink, stmt_idx);
                state.finalise(&mut self.sink, stmt_idx);

                return Ok(());
            }

            match stmt {
                Statement::Assign { dst, .. } if dst == self.lv => {
                    debug!("{}Assigned to, return", self.mir_res.position());
                    state.finalise(&mut self.sink, stmt_idx);

                    return Ok(());
                }

                Statement::Drop { slot, .. } => {
                    self.scan(stmt_idx, &mut state, |scan| {
                        visit_lvalue(slot, ValUsage::Read, scan)
                    });

                    if slot == self.lv {
                        debug!("{}Dropped, return", self.mir_res.position());
                        state.mark_read(&mut self.sink, stmt_idx);
                        state.finalise(&mut self.sink, stmt_idx);

                        return Ok(());
                    }
                }

                Statement::Asm { outputs, .. } if outputs.iter().any(|(_, lv)| lv == self.lv) => {
                    debug!("{}Assigned (asm!), return", self.mir_res.position());
                    state.finalise(&mut self.sink, stmt_idx);

                    return Ok(());
                }

                _ => {}
            }

            stmt_idx += 1;
        }

        self.mir_res.set_cur_stmt_term(bb_idx);
        self.visited_statements[block_start + stmt_idx] = true;

        if self.scan(stmt_idx, &mut state, |scan| {
            visit_terminator(&bb.terminator, scan)
        }) {
            debug!("{}Moved, return", self.mir_res.position());
            state.mark_read(&mut self.sink, stmt_idx);
            state.finalise(&mut self.sink, stmt_idx);

            return Ok(());
        }

        match &bb.terminator {
            Terminator::Incomplete | Terminator::Return | Terminator::Diverge => {
                debug!("{}End of function", self.mir_res.position());
                state.finalise(&mut self.sink, stmt_idx);
            }

            Terminator::Goto(target) => self.states_to_do.push((*target, state)),
            Terminator::Panic { dst } => self.states_to_do.push((*dst, state)),

            Terminator::If { bb0, bb1, .. } => {
                self.states_to_do.push((*bb0, state.clone()));
                self.states_to_do.push((*bb1, state));
            }

            Terminator::Switch { targets, .. } => {
                if let Some((&last, rest)) = targets.split_last() {
                    for &target in rest {
                        self.states_to_do.push((target, state.clone()));
                    }

                    self.states_to_do.push((last, state));
                }
            }

            Terminator::Call {
                ret_block,
                panic_block,
                ret_val,
                ..
            } => {
                if ret_val == self.lv {
                    debug!("{}Assigned (Call), return", self.mir_res.position());
                    state.finalise(&mut self.sink, stmt_idx);

                    return Ok(());
                }

                let panic_bb = self.mir_res.get_block(*panic_block)?;

                if panic_bb.statements.is_empty() && panic_bb.terminator == Terminator::Diverge {
                    trace!("skipping the diverging panic edge to BB{}", panic_block);
                } else {
                    self.states_to_do.push((*panic_block, state.clone()));
                }

                self.states_to_do.push((*ret_block, state));
            }
        }

        Ok(())
    }
}

/// Extends `vl` with the lifetime of the value assigned to `lv` just before `bb_idx/stmt_idx`.
#[instrument(level = "debug", skip(mir_res, block_offsets, lv, vl), fields(lv = %lv))]
fn determine_value_lifetime<S>(
    mir_res: &mut TypeResolve<'_, S>,
    block_offsets: &BlockOffsets,
    bb_idx: BasicBlockId,
    stmt_idx: usize,
    lv: &LValue,
    vl: &mut ValueLifetime,
) -> MirResult<()>
where
    S: TypeService + ?Sized,
{
    let ty = mir_res.get_lvalue_type(lv)?;
    let is_copy = mir_res.type_is_copy(&ty);

    let mut runner = Runner {
        mir_res,
        lv,
        sink: Sink { block_offsets, vl },
        is_copy,
        visited_statements: vec![false; block_offsets.statement_count()],
        states_to_do: vec![],
    };
    let mut post_check_list = vec![];

    runner.run_block(bb_idx, stmt_idx, State::new(bb_idx, stmt_idx))?;

    while let Some((bb_idx, mut state)) = runner.states_to_do.pop() {
        trace!(state = %state, "-> BB{}", bb_idx);
        runner.mir_res.get_block(bb_idx)?;
        state.bb_history.push(bb_idx);

        let start = block_offsets.block_start(bb_idx);

        if runner.visited_statements[start] {
            if runner.sink.valid_at_start(bb_idx) {
                debug!("Looped (to already valid)");
                state.mark_read(&mut runner.sink, 0);
                state.finalise(&mut runner.sink, 0);
            } else if state.is_borrowed {
                debug!("Looped (borrowed)");
                state.mark_read(&mut runner.sink, 0);
                state.finalise(&mut runner.sink, 0);
            } else {
                debug!("Looped (after last read), push for later");
                post_check_list.push((bb_idx, state));
            }

            continue;
        }

        // another assignment of the same slot already covers this block
        if runner.sink.valid_at_start(bb_idx) {
            debug!("Already valid in BB{}", bb_idx);
            state.mark_read(&mut runner.sink, 0);
            state.finalise(&mut runner.sink, 0);

            continue;
        }

        runner.run_block(bb_idx, 0, state)?;
    }

    // a loop-back is live if its target became live on some other path
    while !post_check_list.is_empty() {
        let mut change = false;
        let sink = &mut runner.sink;

        post_check_list.retain_mut(|(bb_idx, state)| {
            if sink.valid_at_start(*bb_idx) {
                debug!("Looped (now valid)");
                change = true;
                state.mark_read(sink, 0);
                state.finalise(sink, 0);

                false
            } else {
                true
            }
        });

        if !change {
            break;
        }
    }

    Ok(())
}

struct Lifetimes {
    slots: Vec<ValueLifetime>,
    args: Vec<ValueLifetime>,
}

impl Lifetimes {
    fn get_mut(&mut self, lv: &LValue) -> Option<&mut ValueLifetime> {
        match *lv {
            LValue::Local(idx) => self.slots.get_mut(idx as usize),
            LValue::Argument(idx) => self.args.get_mut(idx as usize),
            _ => None,
        }
    }
}

fn is_slot(lv: &LValue) -> bool {
    matches!(lv, LValue::Local(_) | LValue::Argument(_))
}

/// Starts a search for a value assigned to `lv` (or to a part of a slot `lv` projects from).
fn assigned_lvalue<S>(
    mir_res: &mut TypeResolve<'_, S>,
    block_offsets: &BlockOffsets,
    lifetimes: &mut Lifetimes,
    bb_idx: BasicBlockId,
    stmt_idx: usize,
    lv: &LValue,
) -> MirResult<()>
where
    S: TypeService + ?Sized,
{
    if is_slot(lv) {
        let Some(vl) = lifetimes.get_mut(lv) else {
            mir_bug!(mir_res, "Slot {} out of range", lv);
        };

        determine_value_lifetime(mir_res, block_offsets, bb_idx, stmt_idx, lv, vl)?;
        // an assigned value is live for at least one point
        vl.fill(block_offsets, bb_idx, stmt_idx, stmt_idx);

        return Ok(());
    }

    // not a slot itself, but it may write to a part of one
    let mut written = vec![];
    visit_lvalue(lv, ValUsage::Write, &mut |ilv: &LValue, usage: ValUsage| {
        if usage == ValUsage::Write && is_slot(ilv) {
            written.push(ilv.clone());
        }

        false
    });

    for slot in written {
        let Some(vl) = lifetimes.get_mut(&slot) else {
            mir_bug!(mir_res, "Slot {} out of range", slot);
        };

        determine_value_lifetime(mir_res, block_offsets, bb_idx, stmt_idx, lv, vl)?;
        vl.fill(block_offsets, bb_idx, stmt_idx, stmt_idx);
    }

    Ok(())
}

pub fn get_lifetimes<S>(mir_res: &mut TypeResolve<'_, S>) -> MirResult<ValueLifetimes>
where
    S: TypeService + ?Sized,
{
    get_lifetimes_with(mir_res, &mut ())
}

/// Computes the lifetime of every slot, then hands the result to `observer`.
#[instrument(level = "debug", skip_all, fields(path = %mir_res.position().path))]
pub fn get_lifetimes_with<S, O>(
    mir_res: &mut TypeResolve<'_, S>,
    observer: &mut O,
) -> MirResult<ValueLifetimes>
where
    S: TypeService + ?Sized,
    O: LifetimeObserver + ?Sized,
{
    let fcn = mir_res.function();
    let block_offsets = BlockOffsets::new(fcn);
    let statement_count = block_offsets.statement_count();

    let mut lifetimes = Lifetimes {
        slots: vec![ValueLifetime::new(statement_count); fcn.locals.len()],
        args: vec![ValueLifetime::new(statement_count); fcn.args.len()],
    };

    // arguments are assigned on entry
    if !fcn.blocks.is_empty() {
        for idx in 0..fcn.args.len() {
            mir_res.set_cur_stmt(0, 0);
            assigned_lvalue(
                mir_res,
                &block_offsets,
                &mut lifetimes,
                0,
                0,
                &LValue::Argument(idx as u32),
            )?;
        }
    }

    for (bb_idx, bb) in fcn.blocks.iter().enumerate() {
        for (stmt_idx, stmt) in bb.statements.iter().enumerate() {
            mir_res.set_cur_stmt(bb_idx, stmt_idx);

            match stmt {
                Statement::Assign { dst, .. } => {
                    assigned_lvalue(
                        mir_res,
                        &block_offsets,
                        &mut lifetimes,
                        bb_idx,
                        stmt_idx + 1,
                        dst,
                    )?;
                }

                Statement::Asm { outputs, .. } => {
                    for (_, lv) in outputs {
                        assigned_lvalue(
                            mir_res,
                            &block_offsets,
                            &mut lifetimes,
                            bb_idx,
                            stmt_idx + 1,
                            lv,
                        )?;
                    }
                }

                // keeps a drop from looking like the use of a dead value
                Statement::Drop { slot, .. } if is_slot(slot) => {
                    let Some(vl) = lifetimes.get_mut(slot) else {
                        mir_bug!(mir_res, "Slot {} out of range", slot);
                    };

                    vl.fill(&block_offsets, bb_idx, stmt_idx, stmt_idx);
                }

                _ => {}
            }
        }

        mir_res.set_cur_stmt_term(bb_idx);

        if let Terminator::Call {
            ret_block, ret_val, ..
        } = &bb.terminator
        {
            mir_res.get_block(*ret_block)?;
            assigned_lvalue(
                mir_res,
                &block_offsets,
                &mut lifetimes,
                *ret_block,
                0,
                ret_val,
            )?;
        }
    }

    let result = ValueLifetimes {
        block_offsets,
        slots: lifetimes.slots,
        args: lifetimes.args,
    };

    observer.lifetimes_computed(&mir_res.position().path, &result);

    Ok(result)
}
