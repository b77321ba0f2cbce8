//! Launch orchestration for the backward pass of fused multi-head attention.
//!
//! The crate builds per-batch-element tensor descriptors for variable-length
//! batches, assembles them into a grouped GEMM argument, and drives an
//! attention backward engine through its lifecycle on a caller-owned stream.

pub mod backends;
pub mod config;
pub mod data_type;
pub mod prelude;
pub mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::*;
pub use data_type::*;
pub use utils::*;
