mod common;

use insta::assert_snapshot;
use pretty_assertions::assert_eq;

use mirlife::analysis::{
    get_lifetimes, get_lifetimes_with, render_lifetime, BlockOffsets, LifetimeObserver,
    TracingDump, TypeResolve, ValueLifetimes,
};
use mirlife::env::Program;
use mirlife::errors::{ErrorClass, MirError};
use mirlife::ir::{
    CallTarget, Constant, CoreType, Function, GenericPath, LValue, Param, RValue,
    Statement, Terminator, Type,
};
use mirlife::position::StmtIdx;

use self::common::*;

fn i32_ty() -> Type {
    prim(CoreType::I32)
}

fn pair_i32() -> Type {
    struct_ty(&["demo", "Pair"], vec![i32_ty()])
}

fn run(fcn: &Function) -> ValueLifetimes {
    try_run(fcn).unwrap()
}

fn try_run(fcn: &Function) -> Result<ValueLifetimes, MirError> {
    let krate = demo_crate();
    let mut mir_res = TypeResolve::new(FN_PATH, fcn, &krate);

    get_lifetimes(&mut mir_res)
}

/// One rendered line per argument and local, with trailing dead points trimmed.
fn picture(lifetimes: &ValueLifetimes) -> String {
    let offsets = lifetimes.block_offsets();

    lifetimes
        .args()
        .iter()
        .enumerate()
        .map(|(idx, lifetime)| render_lifetime("a", idx, lifetime, offsets))
        .chain(
            lifetimes
                .slots()
                .iter()
                .enumerate()
                .map(|(idx, lifetime)| render_lifetime("_", idx, lifetime, offsets)),
        )
        .map(|line| line.trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn live_points(lifetimes: &ValueLifetimes, slot: usize) -> Vec<usize> {
    lifetimes
        .slot(slot)
        .bits()
        .iter()
        .enumerate()
        .filter_map(|(idx, &live)| live.then_some(idx))
        .collect()
}

fn call(ret_block: usize, panic_block: usize, ret_val: LValue, args: Vec<Param>) -> Terminator {
    Terminator::Call {
        ret_block,
        panic_block,
        ret_val,
        fcn: CallTarget::Path(GenericPath::new(path(&["demo", "g"]), vec![]).into()),
        args,
    }
}

fn scope_end() -> Statement {
    Statement::ScopeEnd { slots: vec![] }
}

/// ```text
/// BB0: _0 = 1; goto BB1
/// BB1: _1 = _0; return
/// ```
fn two_blocks() -> Function {
    function(
        vec![],
        vec![i32_ty(), i32_ty()],
        vec![
            block(vec![assign_const(local(0), 1)], Terminator::Goto(1)),
            block(vec![assign_use(local(1), local(0))], Terminator::Return),
        ],
    )
}

/// ```text
/// BB0: _0 = 5; goto BB1
/// BB1: _1 = true; if _1 { BB2 } else { BB3 }
/// BB2: _2 = _0; goto BB1
/// BB3: return
/// ```
fn simple_loop() -> Function {
    function(
        vec![],
        vec![i32_ty(), prim(CoreType::Bool), i32_ty()],
        vec![
            block(vec![assign_const(local(0), 5)], Terminator::Goto(1)),
            block(
                vec![Statement::assign(
                    local(1),
                    RValue::Constant(Constant::Bool(true)),
                )],
                Terminator::If {
                    cond: local(1),
                    bb0: 2,
                    bb1: 3,
                },
            ),
            block(vec![assign_use(local(2), local(0))], Terminator::Goto(1)),
            block(vec![], Terminator::Return),
        ],
    )
}

/// ```text
/// BB0: _0 = 1; _1 = &_0; _2 = g(move _1) -> BB2, panic BB1
/// BB1: <panic_stmts>; diverge
/// BB2: return
/// ```
fn borrowed_across_call(panic_stmts: Vec<Statement>) -> Function {
    function(
        vec![],
        vec![i32_ty(), shared(i32_ty()), i32_ty()],
        vec![
            block(
                vec![assign_const(local(0), 1), assign_borrow(local(1), local(0))],
                call(2, 1, local(2), vec![local(1).into()]),
            ),
            block(panic_stmts, Terminator::Diverge),
            block(vec![], Terminator::Return),
        ],
    )
}

#[test]
fn block_offsets() {
    let offsets = BlockOffsets::new(&simple_loop());

    assert_eq!(offsets.as_slice(), &[0, 2, 4, 6, 7]);
    assert_eq!(offsets.to_string(), "[0, 2, 4, 6, 7]");
    assert_eq!(offsets.block_count(), 4);
    assert_eq!(offsets.statement_count(), 7);
    assert_eq!(offsets.block_start(2), 4);
    assert_eq!(offsets.block_limit(2), 1);
    assert_eq!(offsets.block_limit(3), 0);
    assert_eq!(offsets.index_of(1, StmtIdx::Stmt(0)), 2);
    assert_eq!(offsets.index_of(1, StmtIdx::Term), 3);
    assert_eq!(offsets.index_of(3, StmtIdx::Term), 6);
    assert!(offsets.is_block_start(4));
    assert!(!offsets.is_block_start(5));
    assert!(!offsets.is_block_start(7));
}

#[test]
fn two_block_read() {
    let lifetimes = run(&two_blocks());

    assert_eq!(live_points(&lifetimes, 0), vec![1, 2]);
    assert!(lifetimes.slot_valid(0, 0, StmtIdx::Term));
    assert!(lifetimes.slot_valid(0, 1, StmtIdx::Stmt(0)));
    assert!(!lifetimes.slot_valid(0, 0, StmtIdx::Stmt(0)));
    assert!(!lifetimes.slot_valid(0, 1, StmtIdx::Term));

    assert_eq!(live_points(&lifetimes, 1), vec![3]);

    assert_eq!(
        render_lifetime("_", 0, lifetimes.slot(0), lifetimes.block_offsets()),
        "_$0     :  X|X "
    );
}

#[test]
fn straight_line_is_minimal() {
    let fcn = function(
        vec![],
        vec![i32_ty(), i32_ty(), i32_ty()],
        vec![block(
            vec![
                assign_const(local(0), 1),
                assign_const(local(1), 2),
                assign_add(local(2), local(0), local(1)),
                assign_use(local(1), local(2)),
                scope_end(),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1, 2]);
    // the second assignment starts a new lifetime
    assert_eq!(live_points(&lifetimes, 1), vec![2, 4]);
    assert_eq!(live_points(&lifetimes, 2), vec![3]);
}

#[test]
fn move_ends_lifetime() {
    let fcn = function(
        vec![],
        vec![pair_i32(), pair_i32(), pair_i32()],
        vec![block(
            vec![
                Statement::assign(
                    local(0),
                    RValue::Struct {
                        path: GenericPath::new(path(&["demo", "Pair"]), vec![i32_ty()]),
                        vals: vec![int(1), int(2)],
                    },
                ),
                assign_use(local(1), local(0)),
                assign_use(local(2), local(0)),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1]);
}

#[test]
fn copy_use_does_not_end_lifetime() {
    let fcn = function(
        vec![],
        vec![i32_ty(), i32_ty(), i32_ty()],
        vec![block(
            vec![
                assign_const(local(0), 1),
                assign_use(local(1), local(0)),
                assign_use(local(2), local(0)),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1, 2]);
}

#[test]
fn loop_reaches_fixed_point() {
    let lifetimes = run(&simple_loop());

    assert_snapshot!(picture(&lifetimes), @r###"
    _$0     :  X|XX|XX|
    _$1     :   | X|  |
    _$2     :   |  | X|
    "###);

    // live at the read inside the loop body on every iteration
    assert!(lifetimes.slot_valid(0, 2, StmtIdx::Stmt(0)));
    assert!(lifetimes.slot_valid(0, 1, StmtIdx::Stmt(0)));
    assert!(!lifetimes.slot_valid(0, 3, StmtIdx::Term));
}

/// ```text
/// BB0: _0 = 1; <extra>; goto BB1
/// BB1: if _1 { BB3 } else { BB2 }
/// BB2: goto BB1
/// BB3: <exit>; return
/// ```
fn loop_with_exit(extra: Vec<Statement>, exit: Vec<Statement>) -> Function {
    let mut entry = vec![assign_const(local(0), 1)];
    entry.extend(extra);

    function(
        vec![],
        vec![i32_ty(), prim(CoreType::Bool), i32_ty()],
        vec![
            block(entry, Terminator::Goto(1)),
            block(
                vec![],
                Terminator::If {
                    cond: local(1),
                    bb0: 3,
                    bb1: 2,
                },
            ),
            block(vec![], Terminator::Goto(1)),
            block(exit, Terminator::Return),
        ],
    )
}

#[test]
fn loop_back_becomes_live_after_exit_read() {
    let lifetimes = run(&loop_with_exit(vec![], vec![assign_use(local(2), local(0))]));

    // the back-edge through BB2 is only known live once the read in BB3 has been seen
    assert!(lifetimes.slot_valid(0, 2, StmtIdx::Term));

    assert_snapshot!(picture(&lifetimes), @r###"
    _$0     :  X|X|X|X
    _$1     :   | | |
    _$2     :   | | | X
    "###);
}

#[test]
fn loop_back_stays_dead_without_later_read() {
    let lifetimes = run(&loop_with_exit(vec![assign_use(local(2), local(0))], vec![]));

    assert!(!lifetimes.slot_valid(0, 1, StmtIdx::Term));
    assert!(!lifetimes.slot_valid(0, 2, StmtIdx::Term));

    assert_snapshot!(picture(&lifetimes), @r###"
    _$0     :  X | | |
    _$1     :    | | |
    _$2     :   X| | |
    "###);
}

#[test]
fn analysis_is_idempotent() {
    let fcn = simple_loop();

    assert_eq!(run(&fcn), run(&fcn));
}

#[test]
fn switch_forks_every_target() {
    let fcn = function(
        vec![],
        vec![i32_ty(), prim(CoreType::Usize), i32_ty()],
        vec![
            block(
                vec![assign_const(local(0), 1), assign_const(local(1), 0)],
                Terminator::Switch {
                    val: local(1),
                    targets: vec![1, 2, 3],
                },
            ),
            block(vec![assign_use(local(2), local(0))], Terminator::Return),
            block(vec![], Terminator::Return),
            block(vec![scope_end()], Terminator::Goto(1)),
        ],
    );
    let lifetimes = run(&fcn);

    assert_snapshot!(picture(&lifetimes), @r###"
    _$0     :  XX|X | |XX
    _$1     :   X|  | |
    _$2     :    | X| |
    "###);
}

#[test]
fn diverging_panic_edge_is_pruned() {
    let lifetimes = run(&borrowed_across_call(vec![]));

    assert_eq!(live_points(&lifetimes, 0), vec![1, 2, 4]);
    assert!(!lifetimes.slot_valid(0, 1, StmtIdx::Term));

    assert_snapshot!(picture(&lifetimes), @r###"
    _$0     :  XX| |X
    _$1     :   X| |
    _$2     :    | |X
    "###);
}

#[test]
fn non_trivial_panic_edge_is_followed() {
    let lifetimes = run(&borrowed_across_call(vec![scope_end()]));

    // a borrowed value stays live until the end of every path
    assert_eq!(live_points(&lifetimes, 0), vec![1, 2, 3, 4, 5]);
    assert!(lifetimes.slot_valid(0, 1, StmtIdx::Stmt(0)));
    assert!(lifetimes.slot_valid(0, 1, StmtIdx::Term));
}

#[test]
fn call_result_starts_in_return_block() {
    let fcn = function(
        vec![],
        vec![i32_ty(), i32_ty(), i32_ty()],
        vec![
            block(
                vec![assign_const(local(0), 1)],
                call(2, 1, local(1), vec![local(0).into()]),
            ),
            block(vec![], Terminator::Diverge),
            block(
                vec![assign_add(local(2), local(0), local(1))],
                Terminator::Return,
            ),
        ],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1, 3]);
    assert_eq!(live_points(&lifetimes, 1), vec![3]);
    assert_eq!(live_points(&lifetimes, 2), vec![4]);
}

#[test]
fn borrow_extends_to_end_of_function() {
    let fcn = function(
        vec![],
        vec![i32_ty(), shared(i32_ty()), i32_ty()],
        vec![block(
            vec![
                assign_const(local(0), 1),
                assign_borrow(local(1), local(0)),
                assign_use(local(2), local(1).deref()),
                scope_end(),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1, 2, 3, 4]);
    assert_eq!(live_points(&lifetimes, 1), vec![2]);
    assert_eq!(live_points(&lifetimes, 2), vec![3]);
}

#[test]
fn partial_write_tracks_the_field() {
    let fcn = function(
        vec![],
        vec![tuple(vec![i32_ty(), i32_ty()]), i32_ty()],
        vec![block(
            vec![
                assign_const(local(0).field(0), 1),
                assign_use(local(1), local(0).field(0)),
                scope_end(),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1]);
    assert_eq!(live_points(&lifetimes, 1), vec![2]);
}

#[test]
fn arguments_live_from_entry() {
    let fcn = function(
        vec![i32_ty(), pair_i32()],
        vec![i32_ty()],
        vec![
            block(
                vec![assign_add(local(0), arg(0), int(1))],
                Terminator::Goto(1),
            ),
            block(vec![Statement::drop(arg(1))], Terminator::Return),
        ],
    );
    let lifetimes = run(&fcn);

    assert!(lifetimes.arg_valid(0, 0, StmtIdx::Stmt(0)));
    assert!(!lifetimes.arg_valid(0, 0, StmtIdx::Term));
    assert!(lifetimes.arg_valid(1, 1, StmtIdx::Stmt(0)));
    assert!(!lifetimes.arg_valid(1, 1, StmtIdx::Term));

    assert_snapshot!(picture(&lifetimes), @r###"
    a$0     : X |
    a$1     : XX|X
    _$0     :  X|
    "###);
}

#[test]
fn asm_outputs_assign() {
    let fcn = function(
        vec![],
        vec![i32_ty(), i32_ty()],
        vec![block(
            vec![
                assign_const(local(0), 1),
                Statement::Asm {
                    tpl: "mov {0}, {1}".to_owned(),
                    outputs: vec![("=r".to_owned(), local(1))],
                    inputs: vec![("r".to_owned(), local(0))],
                    clobbers: vec![],
                    flags: vec![],
                },
                scope_end(),
            ],
            Terminator::Return,
        )],
    );
    let lifetimes = run(&fcn);

    assert_eq!(live_points(&lifetimes, 0), vec![1]);
    assert_eq!(live_points(&lifetimes, 1), vec![2]);
}

#[test]
fn empty_function() {
    let fcn = function(vec![i32_ty()], vec![i32_ty()], vec![]);
    let lifetimes = run(&fcn);

    assert_eq!(lifetimes.block_offsets().statement_count(), 0);
    assert!(lifetimes.arg(0).bits().is_empty());
    assert!(lifetimes.slot(0).is_empty());
}

#[test]
fn out_of_range_target_is_reported() {
    let fcn = function(
        vec![],
        vec![i32_ty()],
        vec![block(vec![assign_const(local(0), 1)], Terminator::Goto(7))],
    );
    let err = try_run(&fcn).unwrap_err();

    assert_eq!(err.class, ErrorClass::Assert);
    assert_eq!(
        err.to_string(),
        "::demo::f BB0/TERM: Assert: Block ID 7 out of range"
    );
}

#[test]
fn out_of_range_local_is_reported() {
    let fcn = function(
        vec![],
        vec![i32_ty()],
        vec![block(
            vec![scope_end(), assign_const(local(5), 1)],
            Terminator::Return,
        )],
    );
    let err = try_run(&fcn).unwrap_err();

    assert_eq!(err.to_string(), "::demo::f BB0/1: Bug: Slot _5 out of range");
}

#[test]
fn type_errors_abort_the_analysis() {
    let fcn = function(
        vec![],
        vec![i32_ty(), i32_ty()],
        vec![block(
            vec![assign_use(local(1), local(0)), assign_const(local(0).field(3), 1)],
            Terminator::Return,
        )],
    );
    let err = try_run(&fcn).unwrap_err();

    assert_eq!(err.class, ErrorClass::Bug);
    assert_eq!(
        err.to_string(),
        "::demo::f BB0/1: Bug: Field access on unexpected type - i32"
    );
}

#[derive(Default)]
struct Recorder {
    seen: Vec<(String, ValueLifetimes)>,
}

impl LifetimeObserver for Recorder {
    fn lifetimes_computed(&mut self, path: &str, lifetimes: &ValueLifetimes) {
        self.seen.push((path.to_owned(), lifetimes.clone()));
    }
}

#[test]
fn observers_see_the_result() {
    let krate = demo_crate();
    let fcn = two_blocks();
    let mut recorder = Recorder::default();

    let mut mir_res = TypeResolve::new(FN_PATH, &fcn, &krate);
    let lifetimes = get_lifetimes_with(&mut mir_res, &mut recorder).unwrap();

    assert_eq!(recorder.seen, vec![(FN_PATH.to_owned(), lifetimes.clone())]);

    let mut mir_res = TypeResolve::new(FN_PATH, &fcn, &krate);
    assert_eq!(
        get_lifetimes_with(&mut mir_res, &mut TracingDump).unwrap(),
        lifetimes
    );
}

#[test]
fn programs_load_from_ron() {
    let source = r#"(
        crate: (
            owned_box: Some(["alloc", "boxed", "Box"]),
        ),
        functions: {
            "::demo::f": (
                ret_ty: Tuple([]),
                locals: [Primitive(I32), Primitive(I32)],
                blocks: [
                    (
                        statements: [
                            Assign(
                                dst: Local(0),
                                src: Constant(Int(v: 1, t: I32)),
                            ),
                        ],
                        terminator: Goto(1),
                    ),
                    (
                        statements: [Assign(dst: Local(1), src: Use(Local(0)))],
                        terminator: Return,
                    ),
                ],
            ),
        },
    )"#;

    let program: Program = ron::from_str(source).unwrap();
    let fcn = &program.functions["::demo::f"];
    assert_eq!(fcn, &two_blocks());

    let mut mir_res = TypeResolve::new("::demo::f", fcn, &program.krate);
    assert_eq!(get_lifetimes(&mut mir_res).unwrap(), run(&two_blocks()));
}
