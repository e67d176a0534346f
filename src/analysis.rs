mod dump;
mod lifetimes;
mod resolve;
mod visit;

pub use dump::{render_lifetime, LifetimeObserver, TracingDump};
pub use lifetimes::{get_lifetimes, get_lifetimes_with, BlockOffsets, ValueLifetime, ValueLifetimes};
pub use resolve::TypeResolve;
pub use visit::{
    visit_function, visit_lvalue, visit_param, visit_rvalue, visit_statement, visit_terminator,
    LValueVisitor, ValUsage,
};
