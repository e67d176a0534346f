pub mod analysis;
pub mod env;
pub mod errors;
pub mod ir;
pub mod position;
pub mod util;
