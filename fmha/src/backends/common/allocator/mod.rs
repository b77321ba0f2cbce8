mod allocator;
mod error;
mod scratch_pool;

pub use allocator::Allocator;
pub use error::AllocError;
