use std::path::PathBuf;

use clap::{arg, command, value_parser, ValueEnum};

#[derive(Debug, Clone)]
pub struct MirlifeConfig {
    pub paths: Vec<PathBuf>,
    pub output: OutputKind,

    /// Only these functions are analysed; all of them if empty.
    pub functions: Vec<String>,
    pub dump_bitmaps: bool,
}

impl MirlifeConfig {
    pub fn is_selected(&self, name: &str) -> bool {
        self.functions.is_empty() || self.functions.iter().any(|f| f == name)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputKind {
    #[default]
    Lifetimes,
    Types,
    Debug,
}

pub fn parse_args_or_exit() -> MirlifeConfig {
    use clap::{ArgAction, Command};

    fn command() -> Command {
        command!()
            .arg(
                arg!(files: <FILE> ... "input files (RON-encoded programs)")
                    .value_parser(value_parser!(PathBuf))
                    .required(true),
            )
            .arg(
                arg!(-o --output <KIND> "what to print for each function")
                    .value_parser(value_parser!(OutputKind))
                    .required(false),
            )
            .arg(
                arg!(-f --function <PATH> "analyse only this function (may be repeated)")
                    .action(ArgAction::Append)
                    .required(false),
            )
            .arg(arg!(--"dump-bitmaps" "log the lifetime bitmaps at the debug level"))
    }

    fn parse_args() -> Result<MirlifeConfig, clap::Error> {
        let mut command = command();
        let matches = command.try_get_matches_from_mut(std::env::args_os())?;

        let paths = matches
            .get_many::<PathBuf>("files")
            .map(|paths| paths.cloned().collect())
            .unwrap_or_default();
        let output = matches
            .get_one::<OutputKind>("output")
            .copied()
            .unwrap_or_default();
        let functions = matches
            .get_many::<String>("function")
            .map(|names| names.cloned().collect())
            .unwrap_or_default();
        let dump_bitmaps = matches.get_flag("dump-bitmaps");

        Ok(MirlifeConfig {
            paths,
            output,
            functions,
            dump_bitmaps,
        })
    }

    match parse_args() {
        Ok(cfg) => cfg,

        Err(e) => {
            e.format(&mut command()).exit();
        }
    }
}
