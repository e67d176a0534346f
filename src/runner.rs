use std::path::PathBuf;
use std::process::ExitCode;

use mirlife::env::Program;

use self::config::{parse_args_or_exit, MirlifeConfig};

pub mod config;
mod dump;
mod errors;
mod passes;

pub enum CompilationControl {
    Continue,
    Stop,
}

pub struct PassOutput<O> {
    pub output: O,
    pub compilation_control: CompilationControl,
}

impl<O> PassOutput<O> {
    pub fn stop_with_output(output: O) -> Self {
        Self {
            output,
            compilation_control: CompilationControl::Stop,
        }
    }

    pub fn continue_with_output(output: O) -> Self {
        Self {
            output,
            compilation_control: CompilationControl::Continue,
        }
    }
}

pub struct RunnerCtx {
    pub config: MirlifeConfig,
    pub error_count: usize,
}

impl RunnerCtx {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn stop_if_errors<O>(&self, output: O) -> PassOutput<O> {
        PassOutput {
            output,
            compilation_control: if self.has_errors() {
                CompilationControl::Stop
            } else {
                CompilationControl::Continue
            },
        }
    }
}

pub struct LoadedProgram {
    pub path: PathBuf,
    pub program: Program,
}

macro_rules! return_if_stopped {
    ($ctx:expr, $e:expr) => {
        match $e {
            PassOutput {
                compilation_control: CompilationControl::Stop,
                ..
            } => {
                return if $ctx.has_errors() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }

            PassOutput { output, .. } => output,
        }
    };
}

fn run(mut ctx: RunnerCtx) -> ExitCode {
    let programs = return_if_stopped!(ctx, passes::load_files(&mut ctx));
    let programs = return_if_stopped!(ctx, passes::select_functions(&mut ctx, programs));
    let programs = return_if_stopped!(ctx, passes::dump_programs_if_asked(&mut ctx, programs));
    let programs = return_if_stopped!(ctx, passes::dump_types_if_asked(&mut ctx, programs));
    return_if_stopped!(ctx, passes::compute_lifetimes(&mut ctx, programs));

    if ctx.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

pub fn prepare_and_run() -> ExitCode {
    let config = parse_args_or_exit();
    let ctx = RunnerCtx {
        config,
        error_count: 0,
    };

    run(ctx)
}
