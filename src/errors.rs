use std::error::Error;
use std::fmt::{self, Display};

use crate::position::Position;

/// The kind of an internal-consistency failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorClass {
    /// The IR violates an invariant the lowering stage guarantees.
    Bug,

    /// The input is legal but not supported yet.
    Todo,

    /// An explicit precondition check failed.
    Assert,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bug => "Bug",
                Self::Todo => "Todo",
                Self::Assert => "Assert",
            }
        )
    }
}

/// A fatal analysis failure, tagged with the position it was raised at.
///
/// There is no recovery from these: the enclosing function's analysis stops and
/// nothing it computed so far may be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirError {
    pub class: ErrorClass,
    pub position: Position,
    pub message: String,
}

impl MirError {
    pub fn new(class: ErrorClass, position: Position, message: String) -> Self {
        Self {
            class,
            position,
            message,
        }
    }
}

impl Display for MirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.position, self.class, self.message)
    }
}

impl Error for MirError {}

pub type MirResult<T> = Result<T, MirError>;

/// Returns a [`ErrorClass::Bug`] error from the enclosing function.
///
/// The first argument is anything with an `error(class, message)` method, usually
/// the [`TypeResolve`](crate::analysis::TypeResolve) context.
#[macro_export]
macro_rules! mir_bug {
    ($state:expr, $($arg:tt)+) => {
        return Err($state.error($crate::errors::ErrorClass::Bug, format!($($arg)+)))
    };
}

/// Returns a [`ErrorClass::Todo`] error from the enclosing function.
#[macro_export]
macro_rules! mir_todo {
    ($state:expr, $($arg:tt)+) => {
        return Err($state.error($crate::errors::ErrorClass::Todo, format!($($arg)+)))
    };
}

/// Returns a [`ErrorClass::Assert`] error from the enclosing function unless `$cond` holds.
#[macro_export]
macro_rules! mir_assert {
    ($state:expr, $cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($state.error($crate::errors::ErrorClass::Assert, format!($($arg)+)));
        }
    };
}
