//! Host-memory backend.
//!
//! Buffers live in host memory and the stream records submitted launches
//! instead of executing them, which makes the backend suitable for dry runs
//! of the launch lifecycle and for inspecting what an engine would receive.

mod backend;
mod buffer;
mod context;
mod device;
mod error;
pub mod kernel;
mod stream;

pub use backend::Host;
pub use buffer::HostBuffer;
pub use context::HostContext;
pub use device::HostDevice;
pub use error::HostError;
pub use kernel::{HostAttentionBackwardArgument, HostAttentionBackwardEngine, HostKernels};
pub use stream::{HostLaunchRecord, HostStream};
