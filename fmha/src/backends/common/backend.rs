use std::error::Error;

use super::{Context, Device, Kernels, NativeBuffer, Stream};

pub trait Backend: Sized {
    type Device: Device<Backend = Self>;
    type NativeBuffer: NativeBuffer<Backend = Self>;
    type Context: Context<Backend = Self>;
    type Stream: Stream<Backend = Self>;
    type Kernels: Kernels<Backend = Self>;
    type Error: Error + 'static;
}
