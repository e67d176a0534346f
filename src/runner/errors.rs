use std::error::Error;
use std::fmt::Display;

use mirlife::errors::{ErrorClass, MirError};
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Error,
    Warn,
}

fn format_level(level: Level) -> String {
    match level {
        Level::Error => format!(
            "{}",
            "ERROR".if_supports_color(Stream::Stderr, |text| text.bright_red())
        ),

        Level::Warn => format!(
            "{}",
            "WARN ".if_supports_color(Stream::Stderr, |text| text.yellow())
        ),
    }
}

fn format_class(class: ErrorClass) -> String {
    let tag = format!("MIR {}", class);

    match class {
        ErrorClass::Bug => format!(
            "{}",
            tag.if_supports_color(Stream::Stderr, |text| text.red())
        ),

        ErrorClass::Todo => format!(
            "{}",
            tag.if_supports_color(Stream::Stderr, |text| text.magenta())
        ),

        ErrorClass::Assert => format!(
            "{}",
            tag.if_supports_color(Stream::Stderr, |text| text.bright_red())
        ),
    }
}

pub fn print_diagnostic(level: Level, message: impl Display, source: Option<&dyn Error>) {
    let level = format_level(level);

    match source {
        Some(source) => eprintln!("{} {}: {}", level, message, source),
        None => eprintln!("{} {}", level, message),
    }
}

/// Prints a fatal analysis failure and aborts the process.
pub fn abort_on_mir_error(err: &MirError) -> ! {
    eprintln!(
        "{}: {}{}",
        format_class(err.class),
        err.position,
        err.message
    );

    std::process::abort()
}
