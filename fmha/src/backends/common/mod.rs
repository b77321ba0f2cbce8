mod allocator;
mod backend;
mod buffer;
mod device;
mod device_buffer;
pub mod gpu_types;
pub mod kernel;
mod context;
mod native_buffer;
mod stream;

pub use allocator::{AllocError, Allocator};
pub use backend::Backend;
pub use buffer::ScopedBuffer;
pub use context::Context;
pub use device::Device;
pub use device_buffer::DeviceBuffer;
pub use kernel::Kernels;
pub use native_buffer::NativeBuffer;
pub use stream::Stream;
