pub mod env_utils;
pub mod trace_range;

pub use env_utils::*;
pub use trace_range::TraceRange;
