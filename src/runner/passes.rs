use std::fs;
use std::io;

use mirlife::analysis::{get_lifetimes, get_lifetimes_with, TracingDump, TypeResolve};
use mirlife::env::{Program, TypeService};
use mirlife::errors::MirResult;
use mirlife::ir::{CallTarget, Constant, LValue, Param, RValue, Statement, Terminator, Type};
use tracing::info;

use super::config::OutputKind;
use super::dump::{dump_function_debug, dump_lifetimes, dump_types};
use super::errors::{abort_on_mir_error, print_diagnostic, Level};
use super::{LoadedProgram, PassOutput, RunnerCtx};

pub fn load_files(ctx: &mut RunnerCtx) -> PassOutput<Vec<LoadedProgram>> {
    let mut result = Vec::with_capacity(ctx.config.paths.len());

    for path in &ctx.config.paths {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,

            Err(e) => {
                print_diagnostic(
                    Level::Error,
                    format!("could not load file {}", path.display()),
                    Some(&e),
                );
                ctx.error_count += 1;

                continue;
            }
        };

        match ron::from_str::<Program>(&contents) {
            Ok(program) => {
                info!(
                    path = %path.display(),
                    functions = program.functions.len(),
                    "loaded a program"
                );

                result.push(LoadedProgram {
                    path: path.clone(),
                    program,
                })
            }

            Err(e) => {
                print_diagnostic(
                    Level::Error,
                    format!("could not parse file {}", path.display()),
                    Some(&e),
                );
                ctx.error_count += 1;
            }
        }
    }

    ctx.stop_if_errors(result)
}

pub fn select_functions(
    ctx: &mut RunnerCtx,
    mut programs: Vec<LoadedProgram>,
) -> PassOutput<Vec<LoadedProgram>> {
    for name in &ctx.config.functions {
        let found = programs
            .iter()
            .any(|loaded| loaded.program.functions.contains_key(name));

        if !found {
            print_diagnostic(
                Level::Warn,
                format!("no function named `{}` was found", name),
                None,
            );
        }
    }

    for loaded in &mut programs {
        loaded
            .program
            .functions
            .retain(|name, _| ctx.config.is_selected(name));
    }

    PassOutput::continue_with_output(programs)
}

pub fn dump_programs_if_asked(
    ctx: &mut RunnerCtx,
    programs: Vec<LoadedProgram>,
) -> PassOutput<Vec<LoadedProgram>> {
    if ctx.config.output != OutputKind::Debug {
        return PassOutput::continue_with_output(programs);
    }

    for loaded in &programs {
        for (name, fcn) in &loaded.program.functions {
            if let Err(e) = dump_function_debug(name, fcn, io::stdout()) {
                print_diagnostic(
                    Level::Error,
                    "could not dump the function to stdout",
                    Some(&e),
                );
                ctx.error_count += 1;
            }
        }
    }

    PassOutput::stop_with_output(programs)
}

fn collect_param_type<S>(
    mir_res: &TypeResolve<'_, S>,
    label: String,
    param: &Param,
    types: &mut Vec<(String, Type)>,
) -> MirResult<()>
where
    S: TypeService + ?Sized,
{
    if let Param::Constant(_) = param {
        types.push((label, mir_res.get_param_type(param)?.into_owned()));
    }

    Ok(())
}

fn collect_const_type<S>(
    mir_res: &TypeResolve<'_, S>,
    label: String,
    c: &Constant,
    types: &mut Vec<(String, Type)>,
) -> MirResult<()>
where
    S: TypeService + ?Sized,
{
    types.push((label, mir_res.get_const_type(c)?));

    Ok(())
}

fn rvalue_params(rvalue: &RValue) -> Vec<&Param> {
    match rvalue {
        RValue::Use(_)
        | RValue::Constant(_)
        | RValue::Borrow { .. }
        | RValue::Cast { .. }
        | RValue::UniOp { .. }
        | RValue::DstMeta { .. }
        | RValue::DstPtr { .. } => vec![],

        RValue::SizedArray { val, .. } | RValue::Variant { val, .. } => vec![val],
        RValue::BinOp { val_l, val_r, .. } => vec![val_l, val_r],
        RValue::MakeDst { ptr_val, meta_val } => vec![ptr_val, meta_val],
        RValue::Tuple { vals } | RValue::Array { vals } | RValue::Struct { vals, .. } => {
            vals.iter().collect()
        }
    }
}

/// The types of every slot, every assignment destination and every constant operand.
fn collect_types<S>(mir_res: &mut TypeResolve<'_, S>) -> MirResult<Vec<(String, Type)>>
where
    S: TypeService + ?Sized,
{
    let fcn = mir_res.function();
    let mut types = vec![];

    let slots = std::iter::once(LValue::Return)
        .chain((0..fcn.args.len()).map(|idx| LValue::Argument(idx as u32)))
        .chain((0..fcn.locals.len()).map(|idx| LValue::Local(idx as u32)));

    for lv in slots {
        let ty = mir_res.get_lvalue_type(&lv)?.into_owned();
        types.push((lv.to_string(), ty));
    }

    for (bb_idx, bb) in fcn.blocks.iter().enumerate() {
        for (stmt_idx, stmt) in bb.statements.iter().enumerate() {
            mir_res.set_cur_stmt(bb_idx, stmt_idx);

            let Statement::Assign { dst, src } = stmt else {
                continue;
            };

            let prefix = format!("BB{}/{}", bb_idx, stmt_idx);
            let ty = mir_res.get_lvalue_type(dst)?.into_owned();
            types.push((format!("{} {}", prefix, dst), ty));

            if let RValue::Constant(c) = src {
                collect_const_type(mir_res, format!("{} {}", prefix, c), c, &mut types)?;
            }

            for param in rvalue_params(src) {
                collect_param_type(mir_res, format!("{} {}", prefix, param), param, &mut types)?;
            }
        }

        mir_res.set_cur_stmt_term(bb_idx);

        if let Terminator::Call {
            ret_val, fcn, args, ..
        } = &bb.terminator
        {
            let prefix = format!("BB{}/TERM", bb_idx);

            if let CallTarget::Value(lv) = fcn {
                let ty = mir_res.get_lvalue_type(lv)?.into_owned();
                types.push((format!("{} {}", prefix, lv), ty));
            }

            for param in args {
                collect_param_type(mir_res, format!("{} {}", prefix, param), param, &mut types)?;
            }

            let ty = mir_res.get_lvalue_type(ret_val)?.into_owned();
            types.push((format!("{} {}", prefix, ret_val), ty));
        }
    }

    Ok(types)
}

pub fn dump_types_if_asked(
    ctx: &mut RunnerCtx,
    programs: Vec<LoadedProgram>,
) -> PassOutput<Vec<LoadedProgram>> {
    if ctx.config.output != OutputKind::Types {
        return PassOutput::continue_with_output(programs);
    }

    for loaded in &programs {
        for (name, fcn) in &loaded.program.functions {
            let mut mir_res = TypeResolve::new(name.as_str(), fcn, &loaded.program.krate);
            let types = match collect_types(&mut mir_res) {
                Ok(types) => types,
                Err(e) => abort_on_mir_error(&e),
            };

            if let Err(e) = dump_types(name, &types, io::stdout()) {
                print_diagnostic(Level::Error, "could not dump the types to stdout", Some(&e));
                ctx.error_count += 1;
            }
        }
    }

    PassOutput::stop_with_output(programs)
}

pub fn compute_lifetimes(ctx: &mut RunnerCtx, programs: Vec<LoadedProgram>) -> PassOutput<()> {
    for loaded in &programs {
        info!(path = %loaded.path.display(), "computing lifetimes");

        for (name, fcn) in &loaded.program.functions {
            let mut mir_res = TypeResolve::new(name.as_str(), fcn, &loaded.program.krate);
            let result = if ctx.config.dump_bitmaps {
                get_lifetimes_with(&mut mir_res, &mut TracingDump)
            } else {
                get_lifetimes(&mut mir_res)
            };

            let lifetimes = match result {
                Ok(lifetimes) => lifetimes,
                Err(e) => abort_on_mir_error(&e),
            };

            if let Err(e) = dump_lifetimes(name, &lifetimes, io::stdout()) {
                print_diagnostic(
                    Level::Error,
                    "could not dump the lifetimes to stdout",
                    Some(&e),
                );
                ctx.error_count += 1;
            }
        }
    }

    ctx.stop_if_errors(())
}
